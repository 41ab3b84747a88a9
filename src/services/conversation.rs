//! Retrieval-augmented question answering with a running transcript.
//!
//! A follow-up question is first rewritten into a standalone question using
//! the transcript, then used to fetch context from the index, and finally
//! answered by the chat model with that context. Only the question as typed
//! and the answer enter the transcript; the rewritten question and the
//! retrieved context do not.

use std::sync::Arc;

use crate::error::ConversationError;
use crate::models::{ChatMessage, DocumentChunk, turns};
use crate::services::chat::{ChatModel, PromptMessage};
use crate::services::vector_store::Retriever;

const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{chat_history}
Follow Up Input: {question}
Standalone question:";

const ANSWER_SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
----------------
{context}";

pub struct ConversationSession {
    chat: Arc<dyn ChatModel>,
    retriever: Arc<dyn Retriever>,
    history: Vec<ChatMessage>,
    max_history_turns: Option<usize>,
}

impl ConversationSession {
    pub fn new(chat: Arc<dyn ChatModel>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            chat,
            retriever,
            history: Vec::new(),
            max_history_turns: None,
        }
    }

    /// Limit how many recent turns are used when condensing a follow-up.
    #[must_use]
    pub fn with_max_history_turns(mut self, turns: Option<usize>) -> Self {
        self.max_history_turns = turns;
        self
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Answer `question` and return the updated transcript.
    ///
    /// On error the transcript is left unchanged.
    pub async fn ask(&mut self, question: &str) -> Result<&[ChatMessage], ConversationError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ConversationError::EmptyQuestion);
        }

        let standalone = if self.history.is_empty() {
            question.to_string()
        } else {
            let prompt = CONDENSE_TEMPLATE
                .replace("{chat_history}", &self.render_history())
                .replace("{question}", question);
            let rewritten = self.chat.complete(&[PromptMessage::user(prompt)]).await?;
            tracing::debug!(%rewritten, "condensed follow-up question");
            rewritten
        };

        let context = self.retriever.retrieve(&standalone).await?;
        let messages = answer_prompt(&context, &standalone);
        let answer = self.chat.complete(&messages).await?;

        self.history.push(ChatMessage::human(question));
        self.history.push(ChatMessage::ai(answer));
        tracing::info!(
            turns = self.history.len() / 2,
            context_chunks = context.len(),
            "answered question"
        );

        Ok(&self.history)
    }

    /// Transcript as `Human:` / `Assistant:` lines, oldest first.
    fn render_history(&self) -> String {
        let all = turns(&self.history);
        let skip = match self.max_history_turns {
            Some(max) => all.len().saturating_sub(max),
            None => 0,
        };

        all[skip..]
            .iter()
            .map(|turn| {
                format!(
                    "\n{}: {}\n{}: {}",
                    turn.question.role, turn.question.content, turn.answer.role, turn.answer.content
                )
            })
            .collect()
    }
}

fn answer_prompt(context: &[DocumentChunk], question: &str) -> Vec<PromptMessage> {
    let context = context
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        PromptMessage::system(ANSWER_SYSTEM_TEMPLATE.replace("{context}", &context)),
        PromptMessage::user(question),
    ]
}
