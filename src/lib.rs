//! Campusly
//!
//! A campus assistant chat widget: questions typed into the page are posted
//! to an external responder and the replies are rendered in a scrolling
//! conversation view.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server rendering the widget with HTMX swaps
//! - **Exchange Controller**: one submission → user message, request, reply
//! - **Conversation Store**: append-only transcripts plus `pending`/`connected` flags
//! - **Responder**: the external question-answering endpoint
//!
//! # Modules
//!
//! - [`conversation`]: Transcript, session flags and conversation registry
//! - [`exchange`]: Exchange controller and fallback texts
//! - [`responder`]: Responder trait and HTTP implementation
//! - [`ui`]: HTML rendering
//! - [`server`]: Routes and handlers
//! - [`config`]: Layered configuration
//! - [`telemetry`]: Logging setup

pub mod config;
pub mod conversation;
pub mod exchange;
pub mod responder;
pub mod server;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;

use conversation::ConversationStore;
use responder::Responder;
use ui::Renderer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live conversations.
    pub conversations: ConversationStore,
    /// Responder used for every exchange.
    pub responder: Arc<dyn Responder>,
    /// Widget renderer.
    pub renderer: Arc<Renderer>,
}

impl AppState {
    #[must_use]
    pub fn new(
        conversations: ConversationStore,
        responder: Arc<dyn Responder>,
        renderer: Renderer,
    ) -> Self {
        Self {
            conversations,
            responder,
            renderer: Arc::new(renderer),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conversations", &self.conversations.len())
            .finish_non_exhaustive()
    }
}
