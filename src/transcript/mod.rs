//! Turn-structured transcript accumulation.
//!
//! Transcription fragments for the user and the model arrive interleaved, in
//! arbitrary order relative to each other and to audio chunks. The aggregator
//! buffers them per channel and commits a completed user/model pair only when
//! the remote side signals turn completion. Pure state, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the conversation a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    User,
    Model,
}

/// One completed user-utterance / model-response exchange.
/// Immutable once appended to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user: String,
    pub model: String,
    /// When the turn-complete signal arrived
    pub committed_at: DateTime<Utc>,
}

/// Accumulates transcription fragments for the in-progress turn and owns the
/// committed conversation history.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    pending_user: String,
    pending_model: String,
    history: Vec<ConversationTurn>,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to its channel's pending buffer, in arrival order.
    pub fn append_fragment(&mut self, channel: Channel, text: &str) {
        match channel {
            Channel::User => self.pending_user.push_str(text),
            Channel::Model => self.pending_model.push_str(text),
        }
    }

    /// Commit the pending pair as one turn and clear both buffers.
    ///
    /// Only the remote turn-complete signal triggers this; an empty pending
    /// buffer commits as an empty string.
    pub fn commit_turn(&mut self) {
        let turn = ConversationTurn {
            user: std::mem::take(&mut self.pending_user),
            model: std::mem::take(&mut self.pending_model),
            committed_at: Utc::now(),
        };
        self.history.push(turn);
    }

    /// Clear pending buffers, and the committed history unless `keep_history`.
    pub fn reset(&mut self, keep_history: bool) {
        self.pending_user.clear();
        self.pending_model.clear();
        if !keep_history {
            self.history.clear();
        }
    }

    pub fn pending_user(&self) -> &str {
        &self.pending_user
    }

    pub fn pending_model(&self) -> &str {
        &self.pending_model
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn snapshot_history(&self) -> Vec<ConversationTurn> {
        self.history.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_concatenates_fragments_in_arrival_order() {
        let mut aggregator = TranscriptAggregator::new();
        aggregator.append_fragment(Channel::User, "turn ");
        aggregator.append_fragment(Channel::Model, "the ");
        aggregator.append_fragment(Channel::User, "it up");
        aggregator.append_fragment(Channel::Model, "volume");
        aggregator.commit_turn();

        assert_eq!(aggregator.history().len(), 1);
        assert_eq!(aggregator.history()[0].user, "turn it up");
        assert_eq!(aggregator.history()[0].model, "the volume");
        assert!(aggregator.pending_user().is_empty());
        assert!(aggregator.pending_model().is_empty());
    }

    #[test]
    fn test_commit_with_empty_model_buffer() {
        let mut aggregator = TranscriptAggregator::new();
        aggregator.append_fragment(Channel::User, "hello?");
        aggregator.commit_turn();

        assert_eq!(aggregator.history()[0].user, "hello?");
        assert_eq!(aggregator.history()[0].model, "");
    }

    #[test]
    fn test_no_partial_turns_in_history() {
        let mut aggregator = TranscriptAggregator::new();
        aggregator.append_fragment(Channel::User, "still talking");
        assert!(aggregator.history().is_empty());
    }

    #[test]
    fn test_reset_keeps_history_when_asked() {
        let mut aggregator = TranscriptAggregator::new();
        aggregator.append_fragment(Channel::User, "one");
        aggregator.commit_turn();
        aggregator.append_fragment(Channel::User, "pending");

        aggregator.reset(true);
        assert_eq!(aggregator.history().len(), 1);
        assert!(aggregator.pending_user().is_empty());

        aggregator.reset(false);
        assert!(aggregator.history().is_empty());
    }
}
