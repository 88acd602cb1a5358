//! Bounded, ordered conversation history.

use crate::llm::{Role, Turn};

/// Ordered sequence of turns, oldest first.
///
/// Truncation always drops from the front so the retained turns are the most
/// recent ones, in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Turn>);

impl History {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Keep at most `max` of the most recent turns.
    pub fn truncate_to(&mut self, max: usize) {
        if self.0.len() > max {
            let excess = self.0.len() - max;
            self.0.drain(..excess);
        }
    }

    /// Consume and return a copy bounded to `max` turns.
    #[must_use]
    pub fn truncated(mut self, max: usize) -> Self {
        self.truncate_to(max);
        self
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.0.push(turn);
    }

    /// Drop any `system` turns.
    ///
    /// The persona prompt is injected per request and must never be stored.
    pub fn strip_system(&mut self) {
        self.0.retain(|t| t.role != Role::System);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Turn] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Turn> {
        self.0
    }
}

impl From<Vec<Turn>> for History {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
