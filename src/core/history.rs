//! Bounded dialogue history used as generation context.

use std::collections::VecDeque;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Which side of the conversation produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// One immutable `(speaker, text)` turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: SystemTime,
}

impl ConversationTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: SystemTime::now(),
        }
    }
}

/// Ordered log of the most recent conversation turns.
///
/// Capacity-bounded with strict FIFO eviction. Mutated only by the
/// orchestrator between stages, so no internal locking is needed.
#[derive(Debug)]
pub struct DialogueHistory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl DialogueHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one turn, evicting the oldest if at capacity.
    pub fn append(&mut self, turn: ConversationTurn) {
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Append a completed user/agent exchange as one state update.
    ///
    /// The orchestrator calls this only after the agent reply is known, so
    /// history never holds a user turn without its paired reply.
    pub fn append_exchange(&mut self, user_text: impl Into<String>, agent_text: impl Into<String>) {
        self.append(ConversationTurn::new(Speaker::User, user_text));
        self.append(ConversationTurn::new(Speaker::Agent, agent_text));
    }

    /// Ordered copy of the current turns, oldest first.
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
