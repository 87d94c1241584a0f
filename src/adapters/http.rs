//! HTTP adapter: the conversation endpoint the mobile app talks to.
//!
//! Routes:
//! - `POST /api/conversation`: run one exchange (needs the `x-secret` header)
//! - `GET /health`: liveness probe

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::agent::{Assistant, Message, Metadata, Role, DEFAULT_SESSION};
use crate::config::Config;
use crate::Result;

use super::Channel;

/// Header carrying the shared secret
pub const SECRET_HEADER: &str = "x-secret";

/// Body of `POST /api/conversation`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    pub prompt: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// One turn as the front end renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl From<Message> for Turn {
    fn from(message: Message) -> Self {
        Self {
            role: message.role,
            content: message.content,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub secret: Arc<str>,
}

/// Build the router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/conversation", post(conversation_handler))
        .layer(middleware::from_fn_with_state(state.clone(), secret_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Rejects requests whose `x-secret` header does not match the configured secret.
///
/// An empty configured secret rejects everything.
async fn secret_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(secret) if !state.secret.is_empty() && secret == &*state.secret => Ok(next.run(req).await),
        _ => {
            warn!("Rejected conversation request with missing or wrong secret");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

async fn conversation_handler(
    State(state): State<AppState>,
    Json(request): Json<ConversationRequest>,
) -> Response {
    let session = request.session_id.as_deref().unwrap_or(DEFAULT_SESSION);
    info!(session, prompt_chars = request.prompt.len(), "Conversation request");

    match state
        .assistant
        .converse(session, &request.prompt, request.metadata)
        .await
    {
        Ok(turns) => {
            let turns: Vec<Turn> = turns.into_iter().map(Turn::from).collect();
            match serde_json::to_string(&turns) {
                // the mobile client parses the body itself, so it must not be typed as JSON
                Ok(body) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response(),
                Err(e) => {
                    error!(session, error = %e, "Failed to serialize turns");
                    failure_response()
                }
            }
        }
        Err(e) => {
            error!(session, error = %e, "Conversation failed");
            failure_response()
        }
    }
}

fn failure_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "The assistant could not answer this prompt." })),
    )
        .into_response()
}

/// HTTP channel serving the conversation endpoint until stopped or Ctrl+C.
pub struct HttpChannel {
    addr: String,
    state: AppState,
    shutdown: Arc<Notify>,
}

impl HttpChannel {
    pub fn new(config: &Config, assistant: Arc<Assistant>) -> Self {
        Self {
            addr: format!("{}:{}", config.server.host, config.server.port),
            state: AppState {
                assistant,
                secret: Arc::from(config.secret.as_str()),
            },
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }
}

impl Channel for HttpChannel {
    fn name(&self) -> &str {
        "http"
    }

    async fn start(&self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr.as_str()).await?;
        info!(addr = %listener.local_addr()?, "Lola listening");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Ctrl+C received, shutting down"),
                    _ = shutdown.notified() => info!("Stop requested, shutting down"),
                }
            })
            .await?;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.shutdown.notify_one();
        Ok(())
    }
}
