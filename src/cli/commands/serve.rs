//! HTTP API server for the chat frontend.
//!
//! Provides the chat, health and status endpoints over one shared session.

use crate::chat_log::ChatLog;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::{DefaultSessionFactory, SessionHandle};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Default page size for `GET /api/history`.
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Shared application state.
pub struct AppState {
    pub sessions: Arc<SessionHandle>,
    pub chat_log: Option<Arc<ChatLog>>,
}

/// Build the API router over a session handle, without a chat log.
pub fn build_router(sessions: Arc<SessionHandle>) -> Router {
    build_router_with_log(sessions, None)
}

/// Build the API router. Answered questions are recorded in `chat_log` when given.
pub fn build_router_with_log(
    sessions: Arc<SessionHandle>,
    chat_log: Option<Arc<ChatLog>>,
) -> Router {
    let state = Arc::new(AppState { sessions, chat_log });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/status", get(status))
        .route("/api/refresh", post(refresh))
        .route("/api/history", get(history))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    no_warm: bool,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'legis doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let warm = settings.server.warm_on_startup && !no_warm;

    let chat_log = ChatLog::from_settings(&settings)?.map(Arc::new);
    let sessions = Arc::new(SessionHandle::new(Arc::new(DefaultSessionFactory::new(settings))));

    if warm {
        let spinner = Output::spinner("Building document index...");
        let result = sessions.ensure_ready().await;
        spinner.finish_and_clear();
        match result {
            Ok(session) => Output::success(&format!(
                "Indexed {} chunks from {} local and {} PDF documents",
                session.index.chunks,
                session.corpus.local_documents,
                session.corpus.remote_documents
            )),
            Err(e) => {
                Output::warning(&format!("Failed to build chat session: {}", e));
                Output::info("Chat requests will fail until POST /api/refresh succeeds.");
            }
        }
    } else {
        let background = sessions.clone();
        tokio::spawn(async move {
            if let Err(e) = background.ensure_ready().await {
                error!("Background index build failed: {}", e);
            }
        });
    }

    let app = build_router_with_log(sessions, chat_log);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Legis API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Root", "GET  /");
    Output::kv("Health", "GET  /api/health");
    Output::kv("Chat", "POST /api/chat");
    Output::kv("Status", "GET  /api/status");
    Output::kv("Refresh", "POST /api/refresh");
    Output::kv("History", "GET  /api/history");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
    q: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl ToString) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Server is running!" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message must not be empty");
    }

    let session = match state.sessions.get().await {
        Ok(session) => session,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    match session.engine.chat(&req.message).await {
        Ok(response) => {
            if let Some(log) = &state.chat_log {
                if let Err(e) = log.record(&req.message, &response.answer) {
                    warn!("Failed to record chat exchange: {}", e);
                }
            }
            Json(ChatResponse {
                response: response.answer,
            })
            .into_response()
        }
        Err(e) => {
            error!("Error in chat endpoint: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.sessions.status().await)
}

async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.sessions.refresh().await {
        Ok(_) => Json(state.sessions.status().await).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let Some(log) = &state.chat_log else {
        return error_response(StatusCode::NOT_FOUND, "Chat log is disabled");
    };

    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let result = match query.q.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(q) => log.search(q, limit),
        None => log.recent(limit),
    };

    match result {
        Ok(exchanges) => Json(exchanges).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChatMode;
    use crate::corpus::CorpusSummary;
    use crate::embedding::HashedEmbedder;
    use crate::error::{LegisError, Result};
    use crate::index::IndexStats;
    use crate::rag::{ChatEngine, ChatMessage, ContextBuilder, LanguageModel};
    use crate::session::{ChatSession, SessionFactory};
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixedModel(std::result::Result<String, String>);

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            self.0.clone().map_err(LegisError::OpenAI)
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FixedFactory(std::result::Result<String, String>);

    #[async_trait]
    impl SessionFactory for FixedFactory {
        async fn build(&self) -> Result<ChatSession> {
            let context = ContextBuilder::new(
                Arc::new(MemoryVectorStore::new()),
                Arc::new(HashedEmbedder::new(8)),
            );
            let model = Arc::new(FixedModel(self.0.clone()));
            Ok(ChatSession {
                engine: ChatEngine::new(model, context, ChatMode::Context),
                corpus: CorpusSummary::default(),
                index: IndexStats::default(),
                failures: Vec::new(),
                built_at: chrono::Utc::now(),
            })
        }
    }

    fn handle(reply: std::result::Result<&str, &str>) -> Arc<SessionHandle> {
        let reply = reply.map(str::to_string).map_err(str::to_string);
        Arc::new(SessionHandle::new(Arc::new(FixedFactory(reply))))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let app = build_router(handle(Ok("hi")));

        let response = app
            .clone()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"status": "healthy"}));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["message"], "Server is running!");
    }

    #[tokio::test]
    async fn test_chat_before_ready_is_500() {
        let app = build_router(handle(Ok("hi")));

        let response = app.oneshot(chat_request(r#"{"message": "hello"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["detail"], "Chat engine not initialized");
    }

    #[tokio::test]
    async fn test_chat_returns_answer() {
        let sessions = handle(Ok("The bill passed."));
        sessions.ensure_ready().await.unwrap();
        let app = build_router(sessions);

        let response = app
            .oneshot(chat_request(r#"{"message": "Did S. 1 pass?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"response": "The bill passed."})
        );
    }

    #[tokio::test]
    async fn test_chat_error_is_500_with_detail() {
        let sessions = handle(Err("rate limited"));
        sessions.ensure_ready().await.unwrap();
        let app = build_router(sessions);

        let response = app.oneshot(chat_request(r#"{"message": "hello"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_empty_message_is_400() {
        let sessions = handle(Ok("unused"));
        sessions.ensure_ready().await.unwrap();
        let app = build_router(sessions);

        let response = app.oneshot(chat_request(r#"{"message": "   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_refresh_then_status() {
        let app = build_router(handle(Ok("hi")));

        let response = app
            .clone()
            .oneshot(Request::post("/api/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["state"], "ready");
        assert_eq!(status["chunks"], 0);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let app = build_router(handle(Ok("hi")));

        let response = app
            .oneshot(
                Request::get("/api/health")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_answers_are_recorded_in_chat_log() {
        let sessions = handle(Ok("The bill passed."));
        sessions.ensure_ready().await.unwrap();
        let log = Arc::new(ChatLog::in_memory().unwrap());
        let app = build_router_with_log(sessions, Some(log.clone()));

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message": "Did S. 1 pass?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let recent = log.recent(5).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].question, "Did S. 1 pass?");
        assert_eq!(recent[0].answer, "The bill passed.");

        let response = app
            .oneshot(Request::get("/api/history?q=S.%201&limit=5").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history = body_json(response).await;
        assert_eq!(history[0]["answer"], "The bill passed.");
    }

    #[tokio::test]
    async fn test_failed_answers_are_not_recorded() {
        let sessions = handle(Err("rate limited"));
        sessions.ensure_ready().await.unwrap();
        let log = Arc::new(ChatLog::in_memory().unwrap());
        let app = build_router_with_log(sessions, Some(log.clone()));

        app.oneshot(chat_request(r#"{"message": "hello"}"#)).await.unwrap();
        assert_eq!(log.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_history_without_log_is_404() {
        let app = build_router(handle(Ok("hi")));
        let response = app
            .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
