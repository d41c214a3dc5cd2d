//! # Reparto Server
//!
//! HTTP API for the inventory and rendition tracker.
//!
//! ## Request Flow
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  Client ─► Router ─► AuthUser/AdminUser ─► Handler ─► db      │
//! │              │         (bearer token +        │                │
//! │              │          revocation check)     └─► DTO ─► JSON  │
//! │              └── TraceLayer + CorsLayer                        │
//! │                                                                │
//! │  Failures surface as {"code": .., "message": ..} with a       │
//! │  matching status; persistence faults flatten to a 500.        │
//! └────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod report;
pub mod routes;

use std::sync::Arc;

use reparto_db::Database;

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use crate::report::{DocumentSink, PlainTextSink};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (internally pooled, cheap to clone)
    pub db: Database,

    /// Loaded server configuration
    pub config: Arc<ServerConfig>,

    /// Token issuer/validator
    pub jwt: Arc<JwtManager>,

    /// Output format for report downloads
    pub report_sink: Arc<dyn DocumentSink>,
}

impl AppState {
    /// Builds the state shared across all request handlers.
    ///
    /// Reports render as plain text; a PDF deployment replaces
    /// `report_sink` with its own [`DocumentSink`].
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_expiry_secs);

        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            report_sink: Arc::new(PlainTextSink),
        }
    }
}
