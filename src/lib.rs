//! # Ingress Log
//!
//! Axum/tower middleware that logs every inbound HTTP request as one
//! structured event.
//!
//! ## Architecture
//!
//! - **Policy** ([`config`]) - Exclusion rules deciding what gets logged
//! - **Body Capture** ([`capture`]) - Read-once request body snapshots
//! - **Response Recorder** ([`recorder`]) - Records status, headers and body as they are written
//! - **Interceptor** ([`middleware`]) - Wraps the handler, recovers panics, logs exactly once
//! - **Record Builder** ([`record`]) - Assembles the logged field mapping
//!
//! ## Record Fields
//!
//! `type`, `url_path`, `req_header`, `req_body`, `rsp_header`, `status`,
//! `rsp_body`, `duration_ms`, `req_timestamp`. Header fields never contain
//! `Authorization`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use axum::{Router, routing::post};
//! use ingress_log::{IngressLog, TracingLogger};
//!
//! let app = Router::new()
//!     .route("/hello", post(hello))
//!     .layer(IngressLog::new(TracingLogger));
//! ```
//!
//! ## Configuration
//!
//! See [`config::IngressConfig`] for exclusion options and the `INGRESS_LOG_*`
//! environment variables.

pub mod capture;
pub mod config;
pub mod context;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod record;
pub mod recorder;

pub mod server;
pub mod settings;
pub mod telemetry;

pub use config::{ExcludeOptions, FieldOptions, IngressConfig};
pub use context::RequestContext;
pub use logger::{StructuredLogger, TracingLogger};
pub use middleware::{IngressLog, IngressLogService};
pub use record::LogRecord;

/// Commonly used types for external consumers.
pub mod prelude {
    pub use crate::config::{ExcludeOptions, IngressConfig};
    pub use crate::context::RequestContext;
    pub use crate::logger::{StructuredLogger, TracingLogger};
    pub use crate::middleware::IngressLog;
    pub use crate::record::LogRecord;
}
