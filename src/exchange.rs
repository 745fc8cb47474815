//! Message exchange controller.
//!
//! Turns one user submission into one transcript round: the user's message,
//! a request to the [`Responder`], and the assistant's reply (or a canned
//! fallback when the reply is empty or the exchange fails).
//!
//! # Usage contract
//!
//! The controller does not reject a submission while another one is pending.
//! Callers are expected to disable their input affordance while
//! [`Conversation::is_pending`] is true, so at most one request is in flight
//! per conversation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::conversation::{Conversation, Origin};
use crate::responder::Responder;

/// Assistant text used when the responder succeeds without a reply.
pub const NO_RESPONSE_FALLBACK: &str = "Sorry — no response.";

/// Assistant text used when the exchange fails.
pub const FAILURE_FALLBACK: &str = "Sorry — something went wrong. Try again later.";

/// What a call to [`ExchangeController::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing changed.
    Ignored,
    /// The responder's reply was appended.
    Answered,
    /// The responder succeeded without a reply; [`NO_RESPONSE_FALLBACK`] was appended.
    NoResponse,
    /// The exchange failed; [`FAILURE_FALLBACK`] was appended and the
    /// conversation is now disconnected.
    Failed,
}

/// Holds `pending` high for as long as it lives.
struct PendingGuard<'a> {
    conversation: &'a Conversation,
}

impl<'a> PendingGuard<'a> {
    fn engage(conversation: &'a Conversation) -> Self {
        conversation.set_pending(true);
        Self { conversation }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.conversation.set_pending(false);
    }
}

/// Drives exchanges for a single conversation.
#[derive(Clone)]
pub struct ExchangeController {
    conversation: Conversation,
    responder: Arc<dyn Responder>,
}

impl std::fmt::Debug for ExchangeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeController")
            .field("conversation", &self.conversation.id())
            .finish_non_exhaustive()
    }
}

impl ExchangeController {
    #[must_use]
    pub fn new(conversation: Conversation, responder: Arc<dyn Responder>) -> Self {
        Self {
            conversation,
            responder,
        }
    }

    /// The conversation this controller appends to.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Submit user input.
    ///
    /// Whitespace-only input is ignored without touching any state. Otherwise
    /// the trimmed text is appended as a user message and the input buffer is
    /// cleared before the responder is called, and exactly one assistant
    /// message is appended afterwards. `pending` is reset on every exit path,
    /// including when the returned future is dropped mid-request.
    pub async fn submit(&self, raw_text: &str) -> SubmitOutcome {
        let query = raw_text.trim();
        if query.is_empty() {
            debug!(
                conversation_id = %self.conversation.id(),
                "Ignoring empty submission"
            );
            return SubmitOutcome::Ignored;
        }

        let user_message_id = self.conversation.append_new(Origin::User, query).id();
        self.conversation.clear_draft();

        let _pending = PendingGuard::engage(&self.conversation);

        info!(
            name: "exchange.submitted",
            conversation_id = %self.conversation.id(),
            message_id = user_message_id,
            query_length = query.len(),
            "Submitted user message"
        );

        let (text, outcome) = match self.responder.respond(query).await {
            Ok(reply) => match reply.into_text() {
                Some(text) => (text, SubmitOutcome::Answered),
                None => (NO_RESPONSE_FALLBACK.to_string(), SubmitOutcome::NoResponse),
            },
            Err(err) => {
                warn!(
                    name: "exchange.failed",
                    conversation_id = %self.conversation.id(),
                    message_id = user_message_id,
                    error = %err,
                    "Exchange failed"
                );
                self.conversation.set_connected(false);
                (FAILURE_FALLBACK.to_string(), SubmitOutcome::Failed)
            }
        };

        let reply = self.conversation.append_new(Origin::Assistant, text);
        info!(
            name: "exchange.replied",
            conversation_id = %self.conversation.id(),
            message_id = reply.id(),
            outcome = ?outcome,
            reply_length = reply.text().len(),
            "Appended assistant message"
        );

        outcome
    }
}
