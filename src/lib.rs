//! Jarvis Relay
//!
//! Backend relay for a voice-assistant front end: accepts a user message,
//! merges it with short-term per-client history and a persona prompt,
//! forwards it to an LLM completion service and returns the reply.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP layer, static PWA assets and the chat endpoint
//! - **Orchestration**: history merge, prompt assembly, failure boundary
//! - **Sessions**: ephemeral, bounded per-client history
//!
//! # Modules
//!
//! - [`api`]: Chat request/response wire types
//! - [`config`]: Layered configuration
//! - [`llm`]: Completion backend trait, driver and orchestrator
//! - [`session`]: Conversation history storage

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod api;
pub mod config;
pub mod llm;
pub mod logging;
pub mod server;
pub mod session;

use crate::config::AppConfig;

use llm::CompletionOrchestrator;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Completion orchestrator, which also owns the session store.
    pub orchestrator: Arc<CompletionOrchestrator>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
