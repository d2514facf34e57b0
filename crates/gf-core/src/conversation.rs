//! Role-tagged conversation history owned by a generator.

use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered message history for one formalisation session.
///
/// An optional system preamble survives [`Conversation::clear`]; every other
/// turn is dropped. With `save_history` off, each user turn starts again from
/// the preamble, so the model only ever sees the latest instruction.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    preamble: Option<String>,
    save_history: bool,
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new(preamble: Option<String>, save_history: bool) -> Self {
        let mut conversation = Self {
            preamble,
            save_history,
            messages: Vec::new(),
        };
        conversation.clear();
        conversation
    }

    /// Reset to the preamble (or to nothing).
    pub fn clear(&mut self) {
        self.messages.clear();
        if let Some(ref preamble) = self.preamble {
            self.messages.push(Message::system(preamble.clone()));
        }
    }

    /// Append a user turn, honouring `save_history`.
    pub fn push_user(&mut self, content: impl Into<String>) {
        if !self.save_history {
            self.clear();
        }
        self.messages.push(Message::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Messages in order, preamble first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether history is kept between prompts.
    pub fn save_history(&self) -> bool {
        self.save_history
    }

    /// Number of non-preamble turns.
    pub fn turn_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .count()
    }
}
