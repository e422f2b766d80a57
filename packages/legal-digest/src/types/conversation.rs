//! Conversation types - the append-only Q&A history.

use serde::{Deserialize, Serialize};

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Ordered, append-only turn history.
///
/// Turns are only ever added in user/assistant pairs and never edited or
/// removed; the only way to clear the history is a new session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a question and its answer, in that order.
    pub fn push_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ConversationTurn::user(question));
        self.turns.push(ConversationTurn::assistant(answer));
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn, if any.
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_exchange_orders_user_first() {
        let mut history = Conversation::new();
        history.push_exchange("Who pays rent?", "The tenant.");

        assert_eq!(history.len(), 2);
        assert_eq!(history.turns()[0], ConversationTurn::user("Who pays rent?"));
        assert_eq!(history.turns()[1], ConversationTurn::assistant("The tenant."));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationTurn::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","text":"ok"}"#);
    }
}
