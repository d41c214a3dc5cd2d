//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! development defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Development fallback for the JWT signing secret.
///
/// `main` warns loudly when the server comes up with this value; every
/// real deployment must set `JWT_SECRET`.
pub const DEV_JWT_SECRET: &str = "reparto-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,

    /// Bind address for the HTTP listener
    pub bind_addr: String,

    /// SQLite database file path
    pub database_path: String,

    /// Signing key for session tokens
    pub jwt_secret: String,

    /// JWT token lifetime in seconds
    pub jwt_expiry_secs: i64,
}

impl ServerConfig {
    /// Reads every setting from the environment, with defaults that
    /// suit local development.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),

            database_path: env::var("REPARTO_DB_PATH")
                .unwrap_or_else(|_| "./reparto.db".to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),

            jwt_expiry_secs: env::var("JWT_EXPIRY_SECS")
                .unwrap_or_else(|_| "86400".to_string()) // 24 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_EXPIRY_SECS".to_string()))?,
        };

        if config.jwt_expiry_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_EXPIRY_SECS".to_string()));
        }

        Ok(config)
    }

    /// Full listen address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// True while the server is still running on the development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Rejections raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            port: 3000,
            bind_addr: "0.0.0.0".to_string(),
            database_path: "./reparto.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiry_secs: 86400,
        }
    }

    #[test]
    fn test_bind_address() {
        let mut cfg = config();
        assert_eq!(cfg.bind_address(), "0.0.0.0:3000");

        cfg.bind_addr = "127.0.0.1".to_string();
        cfg.port = 8080;
        assert_eq!(cfg.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_dev_secret_detection() {
        let mut cfg = config();
        assert!(cfg.uses_dev_secret());

        cfg.jwt_secret = "an-actual-secret".to_string();
        assert!(!cfg.uses_dev_secret());
    }
}
