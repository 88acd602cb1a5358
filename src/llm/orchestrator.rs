//! Completion orchestrator.
//!
//! The orchestrator owns the request lifecycle for one chat message:
//! 1. Resolve the effective history (client-supplied or stored)
//! 2. Bound it, leaving room for the turn pair this call adds
//! 3. Prefix the persona prompt and append the user message
//! 4. Call the completion backend
//! 5. On success, store the new turn pair and return the reply
//!
//! Failures never touch the session store.
//!
//! # Example
//!
//! ```rust,ignore
//! use jarvis_relay::llm::{ChatDefaults, ChatInput, CompletionOrchestrator};
//! use jarvis_relay::session::SessionStore;
//!
//! let orchestrator = CompletionOrchestrator::new(Some(backend), SessionStore::new(20), ChatDefaults::default());
//! let outcome = orchestrator.respond(ChatInput::new("client-1", "What's the weather like?")).await?;
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use crate::session::{History, SessionStore};

use super::{BackendError, CompletionBackend, Turn};

/// Model used when neither the request nor configuration names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature used when the request does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Persona prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Jarvis, a proactive, mobile-first voice assistant. \
Keep answers brief and helpful. If asked to perform actions you can't do, \
explain simple next steps. Use plain language.";

/// Reply returned when the server has no backend credentials.
pub const NO_CREDENTIALS_NOTICE: &str = "I can't reach my language model right now because the \
server has no API key configured. I'll keep working on this device; ask the operator to set \
OPENAI_API_KEY to enable full replies.";

/// Configured defaults applied to every request.
#[derive(Debug, Clone)]
pub struct ChatDefaults {
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// A validated chat request.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    /// Session key.
    pub client_id: String,
    /// New user message.
    pub message: String,
    /// Client-held history. When non-empty it replaces the stored history.
    pub history: Option<Vec<Turn>>,
    /// Model override.
    pub model: Option<String>,
    /// Temperature override.
    pub temperature: Option<f32>,
    /// The client id was minted for this request alone. Nothing is read from
    /// or written to the session store for it.
    pub ephemeral: bool,
}

impl ChatInput {
    /// Create an input with no overrides.
    #[must_use]
    pub fn new(client_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach client-held history.
    #[must_use]
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = Some(history);
        self
    }
}

/// Result of a successful `respond` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// The backend answered and the session was updated.
    Reply {
        reply: String,
        history_length: usize,
    },
    /// No backend is configured; nothing was sent or stored.
    Degraded {
        notice: String,
        history_length: usize,
    },
}

impl ChatOutcome {
    /// Text to show or speak to the user.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Reply { reply, .. } => reply,
            Self::Degraded { notice, .. } => notice,
        }
    }

    /// Stored history length after the call.
    #[must_use]
    pub fn history_length(&self) -> usize {
        match self {
            Self::Reply { history_length, .. } | Self::Degraded { history_length, .. } => {
                *history_length
            }
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Errors returned by [`CompletionOrchestrator::respond`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The user message was empty.
    #[error("message must not be empty")]
    EmptyMessage,

    /// The client identifier was empty.
    #[error("client_id must not be empty")]
    MissingClientId,

    /// The completion backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Merges history, persona and user input into one completion request.
#[derive(Clone)]
pub struct CompletionOrchestrator {
    backend: Option<Arc<dyn CompletionBackend>>,
    sessions: SessionStore,
    defaults: ChatDefaults,
}

impl std::fmt::Debug for CompletionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionOrchestrator")
            .field("backend", &self.backend.as_ref().map(|_| "CompletionBackend"))
            .field("sessions", &self.sessions)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl CompletionOrchestrator {
    /// Create an orchestrator. `backend` is `None` when no credentials are
    /// configured.
    #[must_use]
    pub fn new(
        backend: Option<Arc<dyn CompletionBackend>>,
        sessions: SessionStore,
        defaults: ChatDefaults,
    ) -> Self {
        Self {
            backend,
            sessions,
            defaults,
        }
    }

    /// Whether a completion backend is available.
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn defaults(&self) -> &ChatDefaults {
        &self.defaults
    }

    /// Produce a reply for `input`, updating the client's session on success.
    pub async fn respond(&self, input: ChatInput) -> Result<ChatOutcome, ChatError> {
        if input.client_id.trim().is_empty() {
            return Err(ChatError::MissingClientId);
        }
        if input.message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let Some(backend) = &self.backend else {
            let history_length = if input.ephemeral {
                0
            } else {
                self.sessions.get(&input.client_id).len()
            };
            info!(
                name: "chat.degraded",
                client_id = %input.client_id,
                "No backend credentials configured, returning notice"
            );
            return Ok(ChatOutcome::Degraded {
                notice: NO_CREDENTIALS_NOTICE.to_string(),
                history_length,
            });
        };

        let _guard = if input.ephemeral {
            None
        } else {
            Some(self.sessions.acquire(&input.client_id).await)
        };

        let max_history = self.sessions.max_history();
        let mut history = if input.ephemeral {
            let mut history = History::from(input.history.unwrap_or_default());
            history.strip_system();
            history
        } else {
            self.effective_history(&input.client_id, input.history)
        };
        history.truncate_to(max_history.saturating_sub(2));

        let prompt = self.build_prompt(&history, &input.message);
        let model = input
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.defaults.model.clone());
        let temperature = input.temperature.unwrap_or(self.defaults.temperature);

        let reply = match backend.complete(&model, &prompt, temperature).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    name: "chat.backend_failed",
                    client_id = %input.client_id,
                    model = %model,
                    error = %err,
                    "Completion backend failed, session left unchanged"
                );
                return Err(err.into());
            }
        };

        history.push(Turn::user(input.message));
        history.push(Turn::assistant(reply.clone()));
        history.truncate_to(max_history);
        let history_length = history.len();
        if !input.ephemeral {
            self.sessions.put(&input.client_id, history);
        }

        info!(
            name: "chat.completed",
            client_id = %input.client_id,
            model = %model,
            prompt_turns = prompt.len(),
            ephemeral = input.ephemeral,
            history_length,
            reply_len = reply.len(),
            "Chat completed"
        );

        Ok(ChatOutcome::Reply {
            reply,
            history_length,
        })
    }

    /// Client history when supplied and non-empty, else the stored one.
    fn effective_history(&self, client_id: &str, client_history: Option<Vec<Turn>>) -> History {
        let mut history = match client_history {
            Some(turns) if !turns.is_empty() => History::from(turns),
            _ => self.sessions.get(client_id),
        };
        history.strip_system();
        history
    }

    /// `[system] + history + [user]`.
    fn build_prompt(&self, history: &History, message: &str) -> Vec<Turn> {
        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(Turn::system(self.defaults.system_prompt.clone()));
        prompt.extend(history.iter().cloned());
        prompt.push(Turn::user(message));
        prompt
    }
}
