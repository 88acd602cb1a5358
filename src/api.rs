//! Wire types for the chat endpoint and boundary validation.
//!
//! Two body shapes are accepted on `POST /chat` and `POST /api/chat`:
//!
//! - `{"message": "...", "history": [...]}`: explicit message plus optional
//!   client-held history
//! - `{"messages": [...]}`: full transcript whose last entry is the new user
//!   message
//!
//! Both are normalized into a [`ChatInput`] before reaching the orchestrator.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{ChatError, ChatInput, ChatOutcome, Role, Turn};

/// Raw request body for the chat endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequestBody {
    /// Session key. A fresh one is minted when absent or blank.
    #[serde(default)]
    pub client_id: Option<String>,
    /// New user message.
    #[serde(default)]
    pub message: Option<String>,
    /// Full transcript, last entry being the new user message.
    #[serde(default)]
    pub messages: Option<Vec<Turn>>,
    /// Client-held history for the `message` shape.
    #[serde(default)]
    pub history: Option<Vec<Turn>>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ChatRequestBody {
    /// Normalize into a [`ChatInput`].
    pub fn into_input(self) -> Result<ChatInput, ApiError> {
        let supplied = self
            .client_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let ephemeral = supplied.is_none();
        let client_id = supplied.unwrap_or_else(|| Uuid::new_v4().to_string());

        let (message, history) = match (self.message, self.messages) {
            (Some(message), _) => (message, self.history),
            (None, Some(mut messages)) => match messages.pop() {
                Some(Turn {
                    role: Role::User,
                    content,
                }) => (content, Some(messages)),
                Some(_) => {
                    return Err(ApiError::BadRequest(
                        "last entry of `messages` must be a user message".to_string(),
                    ));
                }
                None => {
                    return Err(ApiError::BadRequest("`messages` must not be empty".to_string()));
                }
            },
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "request must include `message` or `messages`".to_string(),
                ));
            }
        };

        if message.trim().is_empty() {
            return Err(ApiError::BadRequest("message must not be empty".to_string()));
        }
        if let Some(t) = self.temperature
            && !t.is_finite()
        {
            return Err(ApiError::BadRequest("temperature must be a number".to_string()));
        }

        Ok(ChatInput {
            client_id,
            message,
            history,
            model: self.model,
            temperature: self.temperature,
            ephemeral,
        })
    }
}

/// Successful response body.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponseBody {
    /// Assistant reply, or the degraded-mode notice.
    pub reply: String,
    /// Same text as `reply`, for clients that read `content`.
    pub content: String,
    /// Stored history length for this client.
    pub history_length: usize,
    /// Session key. Minted ids are not stored; callers wanting server-held
    /// history send their own `client_id`.
    pub client_id: String,
    /// Set when no completion backend is configured.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl ChatResponseBody {
    #[must_use]
    pub fn from_outcome(client_id: String, outcome: &ChatOutcome) -> Self {
        Self {
            reply: outcome.text().to_string(),
            content: outcome.text().to_string(),
            history_length: outcome.history_length(),
            client_id,
            degraded: outcome.is_degraded(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed; no backend call was made.
    #[error("{0}")]
    BadRequest(String),

    /// The completion backend failed.
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MissingClientId => Self::BadRequest(err.to_string()),
            ChatError::Backend(e) => Self::Upstream(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody {
            error: self.to_string(),
        }))
            .into_response()
    }
}
