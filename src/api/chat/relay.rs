//! Incremental text forwarding.

/// Tracks what part of the agent's answer has already reached the client.
///
/// Only non-whitespace increments are released. A whitespace-only tail stays
/// pending and goes out with the next increment that has visible text.
#[derive(Debug, Default)]
pub struct TextRelay {
    accumulated: String,
    /// Bytes of `accumulated` delivered to the client
    sent_len: usize,
}

impl TextRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and return the unsent suffix if it is worth sending.
    pub fn push(&mut self, delta: &str) -> Option<String> {
        self.accumulated.push_str(delta);
        let unsent = &self.accumulated[self.sent_len..];
        if unsent.trim().is_empty() {
            return None;
        }
        let unsent = unsent.to_string();
        self.sent_len = self.accumulated.len();
        Some(unsent)
    }

    /// Bytes of text received so far.
    pub fn accumulated_len(&self) -> usize {
        self.accumulated.len()
    }
}
