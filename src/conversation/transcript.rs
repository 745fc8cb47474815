//! Conversation transcript and conversation storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Welcome text seeded as the first transcript entry.
pub const DEFAULT_WELCOME: &str = "Hi! I'm Campusly — your campus assistant.";

/// Default idle timeout before a conversation is dropped from the store (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Typed or quick-prompt input from the person using the widget.
    User,
    /// Reply from the responder, or one of the canned fallbacks.
    Assistant,
}

impl Origin {
    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single transcript entry.
///
/// Messages are immutable once created: the fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: u64,
    origin: Origin,
    text: String,
}

impl Message {
    /// Create a message. Ids come from [`Conversation::next_id`].
    pub fn new(id: u64, origin: Origin, text: impl Into<String>) -> Self {
        Self {
            id,
            origin,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The two independent session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// A request to the responder is outstanding.
    pub pending: bool,
    /// No exchange has failed yet. Never flips back to `true` on its own.
    pub connected: bool,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            pending: false,
            connected: true,
        }
    }
}

/// A single conversation.
///
/// Cloning is cheap and yields a handle onto the same transcript, so the
/// exchange controller and the rendering layer observe the same state.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

#[derive(Debug)]
struct ConversationInner {
    /// Unique conversation identifier.
    id: String,
    /// Transcript in display order.
    messages: RwLock<Vec<Message>>,
    /// Last identifier handed out.
    last_message_id: AtomicU64,
    /// Session flags; the sender doubles as the current value.
    status: watch::Sender<SessionStatus>,
    /// Text sitting in the input box.
    draft: RwLock<String>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Conversation {
    /// Create a conversation whose transcript starts with `welcome`.
    pub fn new(id: impl Into<String>, welcome: impl Into<String>) -> Self {
        let now = Utc::now();
        let (status, _) = watch::channel(SessionStatus::default());
        let conversation = Self {
            inner: Arc::new(ConversationInner {
                id: id.into(),
                messages: RwLock::new(Vec::new()),
                last_message_id: AtomicU64::new(0),
                status,
                draft: RwLock::new(String::new()),
                created_at: now,
                last_activity: RwLock::new(now),
            }),
        };

        conversation.append_new(Origin::Assistant, welcome);
        conversation
    }

    /// Get the conversation ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Reserve the next message identifier. Strictly increasing, starting at 1.
    pub fn next_id(&self) -> u64 {
        self.inner.last_message_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Append a message to the end of the transcript.
    pub fn append(&self, message: Message) {
        let mut guard = self
            .inner
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.push(message);
        drop(guard);
        self.touch();
    }

    /// Create a message with the next identifier and append it.
    ///
    /// The identifier is reserved under the transcript write lock, so
    /// transcript order always matches identifier order.
    pub fn append_new(&self, origin: Origin, text: impl Into<String>) -> Message {
        let mut guard = self
            .inner
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let message = Message::new(self.next_id(), origin, text);
        guard.push(message.clone());
        drop(guard);
        self.touch();
        message
    }

    /// Snapshot of the transcript in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Message> {
        self.inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of transcript entries, including the welcome message.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Current session flags.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.inner.status.borrow()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status().pending
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status().connected
    }

    pub fn set_pending(&self, pending: bool) {
        self.inner.status.send_modify(|status| status.pending = pending);
    }

    pub fn set_connected(&self, connected: bool) {
        self.inner
            .status
            .send_modify(|status| status.connected = connected);
    }

    /// Subscribe to flag changes.
    ///
    /// Every `set_pending`/`set_connected` call is published before it returns.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Replace the input buffer contents.
    pub fn set_draft(&self, text: impl Into<String>) {
        let mut guard = self
            .inner
            .draft
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = text.into();
        drop(guard);
        self.touch();
    }

    /// Current input buffer contents.
    #[must_use]
    pub fn draft(&self) -> String {
        self.inner
            .draft
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Empty the input buffer.
    pub fn clear_draft(&self) {
        self.inner
            .draft
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// Update the last activity timestamp.
    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    /// Check if the conversation has been idle longer than `timeout`.
    ///
    /// A conversation with a request in flight is never idle.
    #[must_use]
    pub fn is_idle_for(&self, timeout: Duration) -> bool {
        if self.is_pending() {
            return false;
        }
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // Negative durations (clock skew) count as active.
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe store for conversations.
///
/// Provides methods for creating, retrieving, and cleaning up conversations.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    inner: Arc<ConversationStoreInner>,
}

#[derive(Debug)]
struct ConversationStoreInner {
    welcome: String,
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_WELCOME)
    }
}

impl ConversationStore {
    /// Create a store whose conversations open with `welcome`.
    pub fn new(welcome: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ConversationStoreInner {
                welcome: welcome.into(),
                conversations: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a new conversation and return it.
    #[must_use]
    pub fn create(&self) -> Conversation {
        let id = Uuid::new_v4().to_string();
        let conversation = Conversation::new(id.clone(), self.inner.welcome.as_str());
        let mut guard = self
            .inner
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(id, conversation.clone());
        conversation
    }

    /// Get a conversation by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Conversation> {
        let guard = self
            .inner
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(id).cloned()
    }

    /// Remove a conversation by ID.
    pub fn remove(&self, id: &str) -> Option<Conversation> {
        let mut guard = self
            .inner
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.remove(id)
    }

    /// Get the number of live conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if there are no conversations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all conversation IDs.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.inner
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Remove conversations that have been idle longer than the timeout.
    ///
    /// Returns the number of conversations removed.
    pub fn cleanup_idle(&self, timeout: Duration) -> usize {
        let mut guard = self
            .inner
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, conversation| !conversation.is_idle_for(timeout));
        before - guard.len()
    }
}
