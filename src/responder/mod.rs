//! External responder abstraction.
//!
//! The responder is whatever answers a user's question: in production the
//! campus RAG service behind `POST /chat`, in tests a scripted stand-in.
//!
//! # Wire format
//!
//! Request body `{"query": "<trimmed text>"}`, success body
//! `{"response": "<reply>"}`. A missing, `null` or empty `response` is not a
//! failure; the exchange controller substitutes its fallback text.
//!
//! # Implementations
//!
//! - [`HttpResponder`]: JSON over HTTP via `reqwest`

pub mod http;

pub use http::HttpResponder;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outbound request payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatQuery<'a> {
    /// The trimmed user text.
    pub query: &'a str,
}

/// Decoded success body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    /// Reply text, if the responder produced one.
    #[serde(default)]
    pub response: Option<String>,
}

impl ChatReply {
    /// Reply with the given text.
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    /// Reply without a usable `response` field.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The reply text, or `None` when absent or empty.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        self.response.filter(|text| !text.is_empty())
    }
}

/// Reasons an exchange with the responder can fail.
///
/// The exchange controller treats every variant the same way; the split
/// exists for logs.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The responder answered with a non-success status.
    #[error("responder returned status {0}")]
    Status(reqwest::StatusCode),

    /// The body was not a JSON object with an optional string `response`.
    #[error("malformed responder body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can answer a query.
///
/// One call is one exchange; implementations must not retry.
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Send `query` and wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered, the responder
    /// reports a non-success status, or the body cannot be decoded.
    async fn respond(&self, query: &str) -> Result<ChatReply, ResponderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_text_filters_empty() {
        assert_eq!(ChatReply::text("9am–9pm").into_text().as_deref(), Some("9am–9pm"));
        assert_eq!(ChatReply::text("").into_text(), None);
        assert_eq!(ChatReply::empty().into_text(), None);
    }

    #[test]
    fn test_reply_decoding() {
        let reply: ChatReply = serde_json::from_str(r#"{"response": "hi", "extra": 1}"#).unwrap();
        assert_eq!(reply.into_text().as_deref(), Some("hi"));

        let reply: ChatReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.into_text(), None);

        let reply: ChatReply = serde_json::from_str(r#"{"response": null}"#).unwrap();
        assert_eq!(reply.into_text(), None);

        assert!(serde_json::from_str::<ChatReply>(r#"{"response": 42}"#).is_err());
        assert!(serde_json::from_str::<ChatReply>("null").is_err());
    }

    #[test]
    fn test_query_encoding() {
        let body = serde_json::to_value(ChatQuery { query: "Library hours" }).unwrap();
        assert_eq!(body, serde_json::json!({ "query": "Library hours" }));
    }
}
