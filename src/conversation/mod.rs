//! Conversation transcript and session status.
//!
//! This module provides in-memory conversation storage for the chat widget.
//! A conversation owns an append-only transcript, the two session flags
//! (`pending` and `connected`), the message id counter and the input buffer.
//!
//! # Architecture
//!
//! - [`Message`]: A single immutable transcript entry
//! - [`Conversation`]: One transcript plus its status flags
//! - [`ConversationStore`]: Thread-safe registry of live conversations
//!
//! # Example
//!
//! ```rust
//! use campusly::conversation::{ConversationStore, Message, Origin};
//!
//! let store = ConversationStore::new("Hi! I'm Campusly.");
//! let conversation = store.create();
//!
//! let id = conversation.next_id();
//! conversation.append(Message::new(id, Origin::User, "Library hours"));
//!
//! let messages = conversation.list();
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[0].origin(), Origin::Assistant);
//! ```

mod transcript;

pub use transcript::{
    Conversation, ConversationStore, DEFAULT_IDLE_TIMEOUT, DEFAULT_WELCOME, Message, Origin,
    SessionStatus,
};
