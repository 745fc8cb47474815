use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::AppState;
use crate::config::AppConfig;
use crate::conversation::{Conversation, ConversationStore, Message, SessionStatus};
use crate::exchange::ExchangeController;
use crate::responder::HttpResponder;
use crate::ui::Renderer;

/// How often idle conversations are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let responder = HttpResponder::new(
        config.responder.endpoint.clone(),
        config.responder.timeout(),
    )?;

    info!(
        name: "responder.config.loaded",
        endpoint = %responder.endpoint(),
        timeout_secs = ?config.responder.timeout_secs,
        "Responder configuration loaded"
    );

    let conversations = ConversationStore::new(config.widget.welcome.as_str());
    let renderer = Renderer::new(config.widget.clone())?;
    let state = AppState::new(conversations.clone(), Arc::new(responder), renderer);

    spawn_idle_sweeper(conversations, config.server.idle_timeout());

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/c/{id}", get(conversation_page))
        .route("/api/chat", post(api_chat))
        .route("/api/conversations/{id}", delete(api_delete_conversation))
        .route("/api/conversations/{id}/messages", get(api_get_messages))
        .route("/api/conversations/{id}/status", get(api_get_status))
        .route("/api/conversations/{id}/transcript", get(api_get_transcript))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn spawn_idle_sweeper(conversations: ConversationStore, timeout: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = conversations.cleanup_idle(timeout);
            if removed > 0 {
                debug!(removed, remaining = conversations.len(), "Dropped idle conversations");
            }
        }
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("failed to render template: {0}")]
    Render(#[from] minijinja::Error),

    #[error("exchange task aborted: {0}")]
    Exchange(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::ConversationNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            Self::Render(_) | Self::Exchange(_) => {
                error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl AppState {
    fn conversation(&self, id: &str) -> Result<Conversation, AppError> {
        self.conversations
            .get(id)
            .ok_or_else(|| AppError::ConversationNotFound(id.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Start a conversation and redirect to it.
async fn index(State(state): State<AppState>) -> Redirect {
    let conversation = state.conversations.create();
    info!(conversation_id = %conversation.id(), "Created conversation");
    Redirect::to(&conversation_path(&conversation))
}

/// GET /c/:id - Render the widget for an existing conversation.
async fn conversation_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let conversation = state.conversation(&id)?;
    Ok(Html(state.renderer.page(&conversation)?))
}

fn conversation_path(conversation: &Conversation) -> String {
    format!("/c/{}", conversation.id())
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body for chat submissions (typed input and quick prompts alike).
#[derive(Debug, Deserialize)]
struct ChatForm {
    conversation_id: String,
    #[serde(default)]
    message: String,
}

/// POST /api/chat - Submit a message.
///
/// HTMX requests get the re-rendered conversation panel; plain form posts
/// are redirected back to the conversation page. Submissions to an unknown
/// conversation are sent to `/` to start a new one.
async fn api_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Result<Response, AppError> {
    let is_htmx = headers.contains_key("hx-request");
    let Some(conversation) = state.conversations.get(&form.conversation_id) else {
        // Swept or deleted while the page was open: start over.
        info!(
            conversation_id = %form.conversation_id,
            "Chat submitted to unknown conversation, restarting"
        );
        return Ok(restart(is_htmx));
    };
    conversation.set_draft(form.message.as_str());

    // The exchange outlives the request if the client disconnects.
    let controller = ExchangeController::new(conversation.clone(), Arc::clone(&state.responder));
    let outcome = tokio::spawn(async move { controller.submit(&form.message).await }).await?;

    debug!(
        conversation_id = %conversation.id(),
        outcome = ?outcome,
        "Chat submission handled"
    );

    if is_htmx {
        Ok(Html(state.renderer.panel(&conversation)?).into_response())
    } else {
        Ok(Redirect::to(&conversation_path(&conversation)).into_response())
    }
}

/// Send the browser back to `/` for a fresh conversation.
fn restart(is_htmx: bool) -> Response {
    if is_htmx {
        (StatusCode::OK, [("hx-redirect", "/")]).into_response()
    } else {
        Redirect::to("/").into_response()
    }
}

/// GET /api/conversations/:id/messages - Transcript as JSON.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.conversation(&id)?.list()))
}

/// GET /api/conversations/:id/status - Session flags as JSON.
async fn api_get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatus>, AppError> {
    Ok(Json(state.conversation(&id)?.status()))
}

/// GET /api/conversations/:id/transcript - Plain-text download.
async fn api_get_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let conversation = state.conversation(&id)?;
    let body = state.renderer.transcript(&conversation);
    let disposition = format!(
        "attachment; filename=\"campusly-transcript-{}.txt\"",
        conversation.id()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// DELETE /api/conversations/:id - Drop a conversation.
async fn api_delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.conversations.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}
