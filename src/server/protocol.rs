use serde::{Deserialize, Serialize};

/// Form posted by the question input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub question: String,
}

impl QuestionForm {
    /// The trimmed question, or `None` when nothing was typed.
    pub fn question(&self) -> Option<&str> {
        let q = self.question.trim();
        (!q.is_empty()).then_some(q)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub chunks: usize,
    pub sessions: usize,
    pub chat_model: String,
}
