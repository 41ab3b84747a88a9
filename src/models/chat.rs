//! Conversation messages.

use serde::{Deserialize, Serialize};

/// Who produced a message in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

impl Role {
    /// Role of the transcript entry at `index`: even entries are questions.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 { Role::Human } else { Role::Ai }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Human => write!(f, "Human"),
            Role::Ai => write!(f, "Assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }
}

/// One question and its answer.
#[derive(Debug, Clone, Copy)]
pub struct ChatTurn<'a> {
    pub question: &'a ChatMessage,
    pub answer: &'a ChatMessage,
}

/// Pair up a transcript into turns. A trailing unanswered question is dropped.
pub fn turns(history: &[ChatMessage]) -> Vec<ChatTurn<'_>> {
    history
        .chunks_exact(2)
        .map(|pair| ChatTurn {
            question: &pair[0],
            answer: &pair[1],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parity() {
        assert_eq!(Role::for_index(0), Role::Human);
        assert_eq!(Role::for_index(1), Role::Ai);
        assert_eq!(Role::for_index(4), Role::Human);
    }

    #[test]
    fn test_turns_pairs_messages() {
        let history = vec![
            ChatMessage::human("q1"),
            ChatMessage::ai("a1"),
            ChatMessage::human("q2"),
            ChatMessage::ai("a2"),
            ChatMessage::human("dangling"),
        ];
        let turns = turns(&history);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].question.content, "q2");
        assert_eq!(turns[1].answer.content, "a2");
    }
}
