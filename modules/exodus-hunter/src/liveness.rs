// Uptime page for external monitors. Not part of the pipeline.

use anyhow::{Context, Result};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tracing::info;

const ONLINE_PAGE: &str = "<!doctype html>\
<html><head><meta charset=\"utf-8\"><title>Exodus Engine</title></head>\
<body style=\"background:#000;color:#0f0;font-family:monospace;padding:50px;\">\
<h1>🟢 EXODUS ENGINE: ONLINE</h1><p>Bot is actively hunting leads...</p></body></html>";

async fn index() -> Html<&'static str> {
    Html(ONLINE_PAGE)
}

async fn ping() -> &'static str {
    "alive"
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::debug_span!(
                        "liveness_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// Serve the liveness routes on `0.0.0.0:{port}` until the process exits.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind liveness server on {addr}"))?;

    info!("Liveness page live on {addr}");
    axum::serve(listener, router())
        .await
        .context("Liveness server stopped")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_body(path: &str) -> (StatusCode, String) {
        let response = router()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_serves_online_page() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("EXODUS ENGINE: ONLINE"));
    }

    #[tokio::test]
    async fn ping_is_alive() {
        let (status, body) = get_body("/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alive");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (status, _) = get_body("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
