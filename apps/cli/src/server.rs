//! HTTP front end: `POST /chat` over a shared router.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use clariq_core::{IntentRouter, KnowledgeBase, PageFetcher};

const HOME_PAGE: &str = "<h1>ClariQ Chat API</h1>\n\
<p>Send POST requests to /chat with JSON containing a 'message' field.</p>\n";

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Request-level failures. Routing itself never fails.
#[derive(Debug)]
enum ApiError {
    InvalidRequest,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "Invalid request",
                }),
            )
                .into_response(),
        }
    }
}

/// Build the axum app over a shared router.
pub(crate) fn app<K, F>(router: Arc<IntentRouter<K, F>>) -> Router
where
    K: KnowledgeBase + 'static,
    F: PageFetcher + 'static,
{
    Router::new()
        .route("/", get(home))
        .route("/chat", post(chat::<K, F>))
        .layer(TraceLayer::new_for_http())
        .with_state(router)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
pub(crate) async fn serve<K, F>(router: IntentRouter<K, F>, addr: &str) -> Result<()>
where
    K: KnowledgeBase + 'static,
    F: PageFetcher + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr()?;

    info!(addr = %local, "chat server listening");
    println!("ClariQ listening on http://{local} (Ctrl+C to stop)");

    axum::serve(listener, app(Arc::new(router)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("HTTP server failed")?;

    info!("chat server stopped");
    Ok(())
}

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

async fn chat<K, F>(
    State(router): State<Arc<IntentRouter<K, F>>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Json<ChatResponse>, ApiError>
where
    K: KnowledgeBase + 'static,
    F: PageFetcher + 'static,
{
    let Json(request) = payload.map_err(|rejection| {
        debug!(%rejection, "rejected chat request");
        ApiError::InvalidRequest
    })?;

    let response = router.respond(&request.message).await;
    Ok(Json(ChatResponse {
        response,
        status: "success",
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use clariq_core::{ChatRouter, build_router};
    use clariq_shared::AppConfig;
    use clariq_storage::Storage;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    async fn test_app() -> Router {
        let path = std::env::temp_dir().join(format!("clariq_server_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&path).await.unwrap();
        storage
            .insert_knowledge("What is AI?", "AI stands for Artificial Intelligence.")
            .await
            .unwrap();
        let router: ChatRouter = build_router(&AppConfig::default(), storage).unwrap();
        app(Arc::new(router))
    }

    fn post_chat(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_routed_response() {
        let response = test_app()
            .await
            .oneshot(post_chat(r#"{"message": "What is AI"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["response"], "AI stands for Artificial Intelligence.");
        assert_eq!(body["status"], "success");
    }

    #[tokio::test]
    async fn chat_rejects_missing_message() {
        let response = test_app()
            .await
            .oneshot(post_chat(r#"{"text": "hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn chat_rejects_malformed_json() {
        let response = test_app()
            .await
            .oneshot(post_chat("{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn chat_rejects_non_json_content_type() {
        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .body(Body::from("message=hello"))
            .unwrap();
        let response = test_app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn home_describes_the_api() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = test_app().await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("/chat"));
    }
}
