//! In-memory similarity index over embedded chunks.
//!
//! The index is populated once from (chunk, vector) pairs and is read-only
//! afterwards: there is no insert, update or delete. Lookups are an exact scan
//! ranked by squared Euclidean distance, which is plenty for the few dozen
//! chunks a CV and a couple of reference letters produce.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{EmbeddingError, IndexError};
use crate::models::{DocumentChunk, SearchHit};
use crate::services::embedding::EmbeddingProvider;

#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<DocumentChunk>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// Pair chunks with their vectors. All vectors must share one dimension.
    pub fn new(chunks: Vec<DocumentChunk>, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::Empty);
        }
        if chunks.len() != vectors.len() {
            return Err(IndexError::VectorCountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        let dimension = vectors[0].len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        Ok(Self {
            chunks,
            vectors,
            dimension,
        })
    }

    /// Embed every chunk with `provider` and build the index.
    pub async fn from_chunks(
        provider: &dyn EmbeddingProvider,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::Empty);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = provider.embed_documents(&texts).await?;
        Self::new(chunks, vectors)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The `k` nearest chunks to `query`, closest first.
    ///
    /// A query of the wrong dimension matches nothing.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if query.len() != self.dimension || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(k)
            .map(|(i, distance)| SearchHit {
                chunk: self.chunks[i].clone(),
                distance,
            })
            .collect()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Looks up context for a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<DocumentChunk>, EmbeddingError>;
}

/// Retriever that embeds the query and scans a shared [`VectorIndex`].
#[derive(Clone)]
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    embeddings: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl IndexRetriever {
    pub fn new(
        index: Arc<VectorIndex>,
        embeddings: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embeddings,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<DocumentChunk>, EmbeddingError> {
        let vector = self.embeddings.embed_query(query).await?;
        let hits = self.index.search(&vector, self.top_k);
        tracing::debug!(
            hits = hits.len(),
            best = hits.first().map(|h| h.distance),
            "retrieved context"
        );
        Ok(hits.into_iter().map(|h| h.chunk).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<DocumentChunk> {
        DocumentChunk::from_texts(texts.iter().map(|s| s.to_string()).collect())
    }

    /// Embeds text as [length, count of 'a'].
    struct CountingEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for CountingEmbeddings {
        async fn embed_documents(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, t.matches('a').count() as f32])
                .collect())
        }
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = VectorIndex::new(
            chunks(&["far", "near", "middle"]),
            vec![vec![10.0, 10.0], vec![0.0, 1.0], vec![3.0, 0.0]],
        )
        .unwrap();

        let hits = index.search(&[0.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.content, "near");
        assert_eq!(hits[1].chunk.content, "middle");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn test_search_caps_at_index_size() {
        let index = VectorIndex::new(chunks(&["one"]), vec![vec![1.0]]).unwrap();
        assert_eq!(index.search(&[0.0], 4).len(), 1);
        assert!(index.search(&[0.0, 1.0], 4).is_empty());
    }

    #[test]
    fn test_new_rejects_mismatched_input() {
        assert!(matches!(
            VectorIndex::new(chunks(&["a", "b"]), vec![vec![1.0]]),
            Err(IndexError::VectorCountMismatch { .. })
        ));
        assert!(matches!(
            VectorIndex::new(chunks(&["a", "b"]), vec![vec![1.0], vec![1.0, 2.0]]),
            Err(IndexError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            VectorIndex::new(Vec::new(), Vec::new()),
            Err(IndexError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_retriever_returns_closest_chunks() {
        let index = VectorIndex::from_chunks(&CountingEmbeddings, chunks(&["aaaa", "bb", "abab"]))
            .await
            .unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), 2);

        let retriever = IndexRetriever::new(Arc::new(index), Arc::new(CountingEmbeddings), 1);
        let found = retriever.retrieve("cc").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "bb");
    }
}
