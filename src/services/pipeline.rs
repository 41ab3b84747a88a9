//! One-shot setup: load documents, chunk them, embed them into an index.

use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{ChunkingConfig, DocumentChunk};
use crate::services::chunker::TextChunker;
use crate::services::embedding::EmbeddingProvider;
use crate::services::loader::{PageExtractor, list_documents, load_pdf_text};
use crate::services::vector_store::VectorIndex;

/// Summary of a setup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub files: Vec<PathBuf>,
    pub text_chars: usize,
    pub chunks_created: usize,
    pub longest_chunk: usize,
    pub dimension: Option<usize>,
    pub duration_ms: u64,
}

/// Load every PDF in `docs_dir` and split the combined text into chunks.
pub fn prepare_chunks(
    docs_dir: &Path,
    chunking: &ChunkingConfig,
    extractor: &dyn PageExtractor,
) -> Result<(Vec<DocumentChunk>, IndexStats), AppError> {
    let started = Instant::now();
    let files = list_documents(docs_dir)?;
    tracing::info!(dir = %docs_dir.display(), files = files.len(), "loading documents");

    let text = load_pdf_text(extractor, &files)?;
    let chunker = TextChunker::from_config(chunking)?;
    let chunks = DocumentChunk::from_texts(chunker.split_text(&text));

    let stats = IndexStats {
        files,
        text_chars: text.chars().count(),
        chunks_created: chunks.len(),
        longest_chunk: chunks.iter().map(DocumentChunk::char_len).max().unwrap_or(0),
        dimension: None,
        duration_ms: started.elapsed().as_millis() as u64,
    };
    tracing::info!(
        chars = stats.text_chars,
        chunks = stats.chunks_created,
        "split documents into chunks"
    );

    Ok((chunks, stats))
}

/// Run the whole setup pass and return the read-only index.
pub async fn build_index(
    docs_dir: &Path,
    chunking: &ChunkingConfig,
    extractor: &dyn PageExtractor,
    embeddings: &dyn EmbeddingProvider,
    show_progress: bool,
) -> Result<(VectorIndex, IndexStats), AppError> {
    let started = Instant::now();
    let (chunks, mut stats) = prepare_chunks(docs_dir, chunking, extractor)?;

    let spinner = show_progress.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Embedding {} chunks...", chunks.len()));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    });

    let index = VectorIndex::from_chunks(embeddings, chunks).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let index = index?;

    stats.dimension = Some(index.dimension());
    stats.duration_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        chunks = index.len(),
        dimension = index.dimension(),
        duration_ms = stats.duration_ms,
        "vector index ready"
    );

    Ok((index, stats))
}
