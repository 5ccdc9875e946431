//! Tracing subscriber setup for binaries embedding the middleware.

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber.
///
/// `log_level` is used when `RUST_LOG` is not set; `log_format` is `json`
/// for one JSON object per line, anything else gives human-readable text.
pub fn init(log_level: &str, log_format: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::warn!("Tracing subscriber already installed: {}", e);
    }
}
