//! Demo server settings loaded from environment variables.
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3000`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//!
//! The ingress record itself is configured separately, see
//! [`IngressConfig::from_env`](crate::config::IngressConfig::from_env).

use anyhow::Result;
use std::env;

use crate::config::IngressConfig;

#[derive(Debug, Clone)]
pub struct Settings {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    pub ingress: IngressConfig,
}

impl Settings {
    /// Loads settings from environment variables.
    pub fn from_env() -> Self {
        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        Self {
            listen_addr,
            log_level,
            log_format,
            ingress: IngressConfig::from_env(),
        }
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is not in `host:port` form
    pub fn validate(&self) -> Result<()> {
        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        Ok(())
    }

    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        self.ingress.print_summary();
    }
}

/// Loads and validates settings from environment variables.
///
/// Expects `.env` to be loaded already (e.g. via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Settings> {
    let settings = Settings::from_env();
    settings.validate()?;
    Ok(settings)
}
