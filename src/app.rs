//! Wiring shared by the CLI commands: logging, remote clients, and the
//! one-time indexing pass.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::models::{Config, api_key_from_env};
use crate::services::{
    ChatModel, ConversationSession, IndexRetriever, IndexStats, OpenAiChat, OpenAiEmbeddings,
    PdfExtractor, Retriever, build_index,
};

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "cvbot=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Everything a conversation needs once the index exists.
pub struct ChatBackend {
    pub chat: Arc<dyn ChatModel>,
    pub retriever: Arc<dyn Retriever>,
    pub stats: IndexStats,
}

impl ChatBackend {
    pub fn conversation(&self, config: &Config) -> ConversationSession {
        ConversationSession::new(self.chat.clone(), self.retriever.clone())
            .with_max_history_turns(config.retrieval.max_history_turns)
    }
}

/// Build the remote clients and run the load, chunk and embed pass once.
pub async fn prepare_backend(config: &Config, show_progress: bool) -> Result<ChatBackend> {
    let api_key = api_key_from_env();
    let embeddings = Arc::new(
        OpenAiEmbeddings::new(&config.embedding, api_key.clone())
            .context("failed to create embedding client")?,
    );
    let chat = Arc::new(
        OpenAiChat::new(&config.chat, api_key).context("failed to create chat client")?,
    );
    tracing::debug!(
        embeddings = embeddings.base_url(),
        chat = chat.base_url(),
        "using model endpoints"
    );

    let (index, stats) = build_index(
        &config.documents.docs_dir,
        &config.chunking,
        &PdfExtractor,
        embeddings.as_ref(),
        show_progress,
    )
    .await
    .context("failed to build the document index")?;

    let retriever = IndexRetriever::new(Arc::new(index), embeddings, config.retrieval.top_k);

    Ok(ChatBackend {
        chat,
        retriever: Arc::new(retriever),
        stats,
    })
}
