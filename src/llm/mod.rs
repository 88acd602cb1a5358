//! Completion backend abstraction and conversation data model.
//!
//! This module defines the [`Turn`] type exchanged with the completion
//! backend and the [`CompletionBackend`] capability the orchestrator is
//! handed at startup.
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: `OpenAI`-compatible Chat Completions API
//!
//! # Example
//!
//! ```rust,ignore
//! use jarvis_relay::llm::{ChatCompletionsDriver, LlmSettings, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.openai.com".to_string(),
//!     api_key: "sk-...".to_string(),
//!     provider: Provider::OpenAI,
//!     timeout: std::time::Duration::from_secs(60),
//! };
//! let driver = ChatCompletionsDriver::new(settings)?;
//! ```

pub mod chat_completions;
pub mod orchestrator;
pub mod provider;

use std::time::Duration;

pub use chat_completions::ChatCompletionsDriver;
pub use orchestrator::{ChatDefaults, ChatError, ChatInput, ChatOutcome, CompletionOrchestrator};
pub use provider::Provider;

/// Connection settings for the completion backend.
///
/// Only built when an API key is configured; its absence is represented by
/// the orchestrator having no backend at all.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Provider shape (URL layout and auth header).
    pub provider: Provider,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("provider", &self.provider)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona prompt, synthesized per request.
    System,
    /// Message typed or spoken by the user.
    User,
    /// Reply produced by the backend.
    Assistant,
}

/// A single conversational message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    /// Author of the turn.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl Turn {
    /// Create a system turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Errors returned by a [`CompletionBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached or the connection failed mid-request.
    #[error("completion backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("completion backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The backend answered 2xx but without a usable reply.
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Capability to turn an ordered turn sequence into a reply.
///
/// Resolved once at startup and injected into the orchestrator.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Request a single, non-streamed completion.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the request fails or the reply cannot be
    /// extracted.
    async fn complete(
        &self,
        model: &str,
        messages: &[Turn],
        temperature: f32,
    ) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_wire_shape() {
        let turn = Turn::assistant("hello");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "role": "assistant", "content": "hello" })
        );
    }

    #[test]
    fn test_unknown_role_rejected() {
        let parsed = serde_json::from_str::<Turn>(r#"{"role":"tool","content":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let settings = LlmSettings {
            base_url: "https://api.openai.com".to_string(),
            api_key: "sk-secret".to_string(),
            provider: Provider::OpenAI,
            timeout: Duration::from_secs(5),
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-secret"));
    }
}
