//! Exactly-once emission of the ingress record.

use axum::http::StatusCode;
use std::time::{Duration, Instant};

use super::IngressLog;
use crate::capture::CapturedRequest;
use crate::context::RequestContext;
use crate::recorder::ResponseRecorder;

/// Status logged when the request future is dropped before it finished,
/// i.e. the client went away mid-handler.
pub(crate) const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Owns everything needed to log one request and emits it at most once.
///
/// [`Finalizer::complete`] logs the finished response. If the finalizer is
/// dropped while still armed, the request was cancelled and a best-effort
/// record is emitted from `Drop`.
pub(crate) struct Finalizer {
    log: IngressLog,
    context: RequestContext,
    request: Option<CapturedRequest>,
    started: Instant,
    req_timestamp: i64,
}

impl Finalizer {
    pub(crate) fn arm(log: IngressLog, context: RequestContext, request: CapturedRequest) -> Self {
        Self {
            log,
            context,
            request: Some(request),
            started: Instant::now(),
            req_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Time since the handler was invoked.
    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn complete(mut self, response: &ResponseRecorder, elapsed: Duration) {
        if let Some(request) = self.request.take() {
            self.log
                .emit(&self.context, &request, response, elapsed, self.req_timestamp);
        }
    }

    /// Drops the finalizer without logging anything.
    pub(crate) fn disarm(mut self) {
        self.request = None;
    }
}

impl Drop for Finalizer {
    fn drop(&mut self) {
        let Some(request) = self.request.take() else {
            return;
        };

        tracing::debug!(
            context_id = %self.context.context_id,
            "Request cancelled before the handler finished"
        );

        let mut response = ResponseRecorder::new();
        response.write_header(
            StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST),
        );
        self.log.emit(
            &self.context,
            &request,
            &response,
            self.started.elapsed(),
            self.req_timestamp,
        );
    }
}
