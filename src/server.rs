//! Demo HTTP server wired with the ingress log middleware.

use anyhow::Result;
use axum::{
    Json, Router,
    body::Bytes,
    extract::Path,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::net::SocketAddr;

use crate::context::RequestContext;
use crate::logger::TracingLogger;
use crate::middleware::IngressLog;
use crate::settings::Settings;

/// Echoes the request body back as JSON.
async fn hello(body: Bytes) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

async fn panic_handler() -> &'static str {
    panic!("demo handler panicked")
}

async fn get_user(Path(id): Path<u64>, ctx: RequestContext) -> impl IntoResponse {
    Json(json!({ "id": id, "context_id": ctx.context_id }))
}

/// Builds the demo router. Every route is wrapped by `ingress`.
pub fn app_router(ingress: IngressLog) -> Router {
    Router::new()
        .route("/hello", post(hello).get(hello))
        .route("/panic", get(panic_handler))
        .route("/users/{id}", get(get_user))
        .route_layer(ingress)
}

/// Runs the demo server until it fails or the process is stopped.
///
/// # Errors
///
/// Returns an error if the listen address is invalid, binding fails, or the
/// server stops with an error.
pub async fn run(settings: Settings) -> Result<()> {
    let ingress = IngressLog::with_config(TracingLogger, settings.ingress.clone());
    let app = app_router(ingress);

    let addr: SocketAddr = settings.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    fn server() -> TestServer {
        TestServer::new(app_router(IngressLog::new(TracingLogger))).unwrap()
    }

    #[tokio::test]
    async fn test_hello_echoes_body() {
        let response = server().post("/hello").text(r#"{"a":1}"#).await;

        response.assert_status_ok();
        assert_eq!(response.text(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_panic_route_returns_fallback() {
        let response = server().get("/panic").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "panic: demo handler panicked.");
    }

    #[tokio::test]
    async fn test_get_user_sees_request_id() {
        let response = server()
            .get("/users/7")
            .add_header("x-request-id", "demo-1")
            .await;

        let body: serde_json::Value = response.json();
        assert_eq!(body["id"], 7);
        assert_eq!(body["context_id"], "demo-1");
    }
}
