//! The ingress log layer and service.

use axum::{
    body::Body,
    extract::Request,
    response::{IntoResponse, Response},
};
use futures::{FutureExt, future::BoxFuture};
use std::{
    panic::AssertUnwindSafe,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tower::{Layer, Service};

use super::finalizer::Finalizer;
use super::recording_body::RecordingBody;
use crate::capture::CapturedRequest;
use crate::config::IngressConfig;
use crate::context::{REQUEST_ID_HEADER, RequestContext};
use crate::error::PanicFault;
use crate::logger::StructuredLogger;
use crate::record::{LOG_TYPE_INGRESS, LogRecord};
use crate::recorder::ResponseRecorder;

/// Ingress log middleware.
///
/// Cheap to clone; the logger and configuration are shared by every
/// service it produces. Use it as a tower [`Layer`] or wrap a single
/// service with [`IngressLog::enforce`].
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, routing::{get, post}};
/// use ingress_log::{IngressConfig, IngressLog, TracingLogger};
///
/// let ingress = IngressLog::with_config(TracingLogger, IngressConfig::from_env());
///
/// let app = Router::new()
///     .route("/hello", post(hello))
///     .route("/users/{id}", get(get_user))
///     .route_layer(ingress);
/// ```
#[derive(Clone)]
pub struct IngressLog {
    logger: Arc<dyn StructuredLogger>,
    config: Arc<IngressConfig>,
}

impl IngressLog {
    /// Creates the middleware with the default configuration, which logs everything.
    pub fn new(logger: impl StructuredLogger) -> Self {
        Self::with_config(logger, IngressConfig::default())
    }

    /// Also installs the panic hook that lets recovered panics report
    /// where they were raised.
    pub fn with_config(logger: impl StructuredLogger, config: IngressConfig) -> Self {
        crate::error::install_panic_hook();
        Self {
            logger: Arc::new(logger),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &IngressConfig {
        &self.config
    }

    /// Wraps `inner` so every request it serves is logged.
    pub fn enforce<S>(&self, inner: S) -> IngressLogService<S> {
        IngressLogService {
            inner,
            ingress: self.clone(),
        }
    }

    /// Builds the record and hands it to the logger, unless policy skips it.
    pub(crate) fn emit(
        &self,
        context: &RequestContext,
        request: &CapturedRequest,
        response: &ResponseRecorder,
        elapsed: Duration,
        req_timestamp: i64,
    ) {
        if !self.config.should_log(response.status()) {
            return;
        }

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let record = LogRecord::build(
            &self.config,
            request,
            response,
            duration_ms,
            req_timestamp,
        );

        let event = format!("{}{}", self.config.event_prefix(), LOG_TYPE_INGRESS);
        self.logger.info_map(&event, context, &record);
    }

    /// Returns the context already attached upstream, or resolves a new one
    /// and attaches it.
    fn attach_context(request: &mut Request) -> RequestContext {
        if let Some(existing) = request.extensions().get::<RequestContext>() {
            return existing.clone();
        }

        let (context, minted) = RequestContext::from_headers(request.headers());
        if minted && let Some(value) = context.header_value() {
            request.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        request.extensions_mut().insert(context.clone());

        context
    }

    async fn intercept<S>(self, request: Request, mut inner: S) -> Result<Response, S::Error>
    where
        S: Service<Request, Response = Response>,
    {
        let (captured, mut request) = CapturedRequest::capture(request).await;
        let context = Self::attach_context(&mut request);

        tracing::debug!(
            context_id = %context.context_id,
            method = %captured.method,
            url = %captured.url,
            "Request captured"
        );

        let finalizer = Finalizer::arm(self, context, captured);

        let response = match AssertUnwindSafe(inner.call(request)).catch_unwind().await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                finalizer.disarm();
                return Err(e);
            }
            Err(payload) => {
                let fault = PanicFault::from_payload(payload);
                fault.report();
                fault.into_response()
            }
        };

        let (parts, body) = response.into_parts();
        let mut recorder = ResponseRecorder::new();
        recorder.record_head(&parts);

        let body = RecordingBody::new(body, recorder, finalizer);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl<S> Layer<S> for IngressLog {
    type Service = IngressLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        self.enforce(inner)
    }
}

/// Service produced by [`IngressLog`].
#[derive(Clone)]
pub struct IngressLogService<S> {
    inner: S,
    ingress: IngressLog,
}

impl<S> Service<Request> for IngressLogService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // The readied service is the one that must handle this request.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(self.ingress.clone().intercept(request, inner))
    }
}
