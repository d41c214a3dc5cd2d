//! # Admin Bootstrap
//!
//! Creates the first administrator account so the API has a principal
//! that can register everyone else.
//!
//! ## Usage
//! ```bash
//! # Default admin account against ./reparto.db
//! cargo run -p reparto-server --bin seed
//!
//! # Explicit credentials and database path
//! cargo run -p reparto-server --bin seed -- --username ana --password s3creto-fuerte --db ./reparto.db
//! ```
//!
//! The bootstrap refuses to run against a database that already has
//! principals; later accounts are created through `POST /api/register`.

use std::env;

use chrono::Utc;
use uuid::Uuid;

use reparto_core::{validation, Role, User};
use reparto_db::{Database, DbConfig};
use reparto_server::auth::hash_password;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut username = String::from("admin");
    let mut password = String::from("changeme");
    let mut db_path = String::from("./reparto.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--username" | "-u" => {
                if i + 1 < args.len() {
                    username = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Reparto Admin Bootstrap");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --username <NAME>  Admin username (default: admin)");
                println!("  -p, --password <PASS>  Admin password (default: changeme)");
                println!("  -d, --db <PATH>        Database file path (default: ./reparto.db)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Reparto Admin Bootstrap");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Username: {}", username);
    println!();

    validation::validate_username(&username)?;
    validation::validate_password(&password)?;

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Never overwrite an existing principal set
    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} principals", existing);
        println!("  Skipping bootstrap; use POST /api/register to add accounts.");
        return Ok(());
    }

    let admin = User {
        id: Uuid::new_v4().to_string(),
        username,
        password_hash: hash_password(&password)?,
        role: Role::Admin,
        created_at: Utc::now(),
    };

    db.users().insert(&admin).await?;

    println!();
    println!("✓ Administrator '{}' created", admin.username);
    println!("  Log in via POST /api/login to obtain a token.");

    Ok(())
}
