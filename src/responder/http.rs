//! HTTP responder.
//!
//! Posts `{"query": ...}` as JSON to a single endpoint and decodes
//! `{"response": ...}` from the body.

use std::time::Duration;

use url::Url;

use super::{ChatQuery, ChatReply, Responder, ResponderError};

/// Responder backed by a JSON endpoint (e.g. `http://localhost:5000/chat`).
#[derive(Debug, Clone)]
pub struct HttpResponder {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpResponder {
    /// Create a responder for `endpoint`.
    ///
    /// `timeout` bounds the whole request; `None` waits as long as the
    /// transport does.
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self, ResponderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ResponderError::Transport)?;
        Ok(Self { http, endpoint })
    }

    /// The endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Responder for HttpResponder {
    async fn respond(&self, query: &str) -> Result<ChatReply, ResponderError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&ChatQuery { query })
            .send()
            .await
            .map_err(ResponderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResponderError::Status(status));
        }

        let body = response.bytes().await.map_err(ResponderError::Transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}
