//! Per-client conversation history.
//!
//! This module provides in-memory storage of conversation history keyed by
//! an opaque client identifier. Nothing is persisted: a restart discards
//! every session, and clients that need durable memory send their own
//! history with each request.
//!
//! # Architecture
//!
//! - [`History`]: Ordered, bounded list of turns
//! - [`SessionStore`]: Thread-safe store with per-client serialization
//!
//! # Example
//!
//! ```rust
//! use jarvis_relay::llm::Turn;
//! use jarvis_relay::session::SessionStore;
//!
//! let store = SessionStore::new(20);
//! let mut history = store.get("client-1");
//! history.push(Turn::user("Hello!"));
//! store.put("client-1", history);
//!
//! assert_eq!(store.get("client-1").len(), 1);
//! ```

mod history;
mod store;

pub use history::History;
pub use store::{DEFAULT_MAX_HISTORY, SessionStore};
