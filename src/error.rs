//! Error types of the ingress pipeline.
//!
//! None of these ever reach the client as a logging failure: capture errors
//! degrade to placeholder values, and a [`PanicFault`] becomes the fixed
//! fallback response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic;
use std::sync::Once;

/// Failure while reading a request or response body.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("body stream error: {0}")]
    Stream(String),
}

/// Where the last panic on this thread was raised, recorded by the hook
/// before unwinding starts.
struct PanicOrigin {
    location: Option<String>,
    backtrace: Backtrace,
}

thread_local! {
    static LAST_PANIC: RefCell<Option<PanicOrigin>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Installs a process-wide panic hook that records the panicking frame's
/// location and backtrace for [`PanicFault::from_payload`].
///
/// The previously installed hook still runs afterwards. Installing more
/// than once is a no-op.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let origin = PanicOrigin {
                location: info.location().map(ToString::to_string),
                backtrace: Backtrace::force_capture(),
            };
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(origin));
            previous(info);
        }));
    });
}

/// A panic caught at the handler boundary.
#[derive(Debug)]
pub struct PanicFault {
    pub message: String,
    /// `file:line:col` of the panic, when the hook saw it.
    pub location: Option<String>,
    pub backtrace: Backtrace,
}

impl PanicFault {
    /// Builds a fault from a `catch_unwind` payload.
    ///
    /// Must run on the thread that panicked. Without the hook installed, the
    /// backtrace is taken here and only shows the catch site.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        let (location, backtrace) = match LAST_PANIC.with(|slot| slot.borrow_mut().take()) {
            Some(origin) => (origin.location, origin.backtrace),
            None => (None, Backtrace::force_capture()),
        };

        Self {
            message,
            location,
            backtrace,
        }
    }

    /// Body text written to the client when the handler panicked.
    pub fn response_body(&self) -> String {
        format!("panic: {}.", self.message)
    }

    /// Reports the fault on the operator channel, outside the ingress record.
    pub fn report(&self) {
        tracing::error!(
            target: "ingress_log::panic",
            panic = %self.message,
            location = self.location.as_deref().unwrap_or("unknown"),
            backtrace = %self.backtrace,
            "[ingress][panic] recovered from handler panic"
        );
    }
}

impl IntoResponse for PanicFault {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.response_body()).into_response()
    }
}
