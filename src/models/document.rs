use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A PDF read from disk, reduced to its per-page text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
    pub pages: Vec<String>,
}

/// A retrieval unit cut from the combined document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
}

impl Document {
    pub fn generate_id(path: &Path) -> String {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(path.to_string_lossy().as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn new(path: PathBuf, pages: Vec<String>) -> Self {
        Self {
            id: Self::generate_id(&path),
            path,
            pages,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// All page texts joined without separators.
    pub fn text(&self) -> String {
        self.pages.concat()
    }
}

impl DocumentChunk {
    pub fn generate_id(content: &str, chunk_index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", chunk_index, content);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    /// Wrap the chunker's output with stable ids and positions.
    pub fn from_texts(texts: Vec<String>) -> Vec<Self> {
        let total_chunks = texts.len() as u32;
        texts
            .into_iter()
            .enumerate()
            .map(|(idx, content)| Self {
                id: Self::generate_id(&content, idx as u32),
                content,
                chunk_index: idx as u32,
                total_chunks,
            })
            .collect()
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
