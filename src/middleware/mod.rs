//! Ingress logging middleware.
//!
//! # Request Lifecycle
//!
//! 1. Snapshot method, URL, headers and body; the handler gets a fresh body
//! 2. Attach a [`RequestContext`](crate::context::RequestContext) unless one
//!    is already present
//! 3. Call the wrapped service inside a panic boundary; a panic becomes
//!    `500 panic: <message>.`
//! 4. Send the response head right away; body frames are copied into a
//!    [`ResponseRecorder`](crate::recorder::ResponseRecorder) as they stream
//!    to the client
//! 5. Emit exactly one record when the body ends, fails or is dropped,
//!    unless policy skips it
//!
//! # Integration
//!
//! Apply to a whole router with `Router::layer`, or with `Router::route_layer`
//! so it only runs for matched routes and path parameters are available to
//! handlers. A single service can be wrapped with
//! [`IngressLog::enforce`].

mod finalizer;
mod ingress_log;
mod recording_body;

pub use ingress_log::{IngressLog, IngressLogService};
