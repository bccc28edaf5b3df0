//! Similarity search over chunk embeddings.
//!
//! The index sits behind a narrow trait so orchestration and retrieval can be
//! tested against doubles. The shipped implementation embeds with fastembed
//! and ranks in process by cosine distance.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{AssistError, Result};
use crate::models::{ChunkMeta, RetrievedChunk};

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// AllMiniLM-L6-v2 via fastembed, run on a blocking thread so ONNX inference
/// doesn't obstruct the async scheduler.
pub struct FastembedEmbedder;

#[async_trait]
impl Embedder for FastembedEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let embeddings = tokio::task::spawn_blocking(move || {
            use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

            let mut model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false),
            )?;
            let embeddings = model.embed(texts, None)?;
            Ok::<Vec<Vec<f32>>, anyhow::Error>(embeddings)
        })
        .await
        .map_err(|e| AssistError::Embedding(e.to_string()))?
        .map_err(|e| AssistError::Embedding(e.to_string()))?;
        Ok(embeddings)
    }
}

/// Nearest-neighbor store over chunk texts. `query` returns hits ordered
/// ascending by distance, length at most `top_k`.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn count(&self) -> Result<usize>;
    async fn index(
        &self,
        ids: Vec<String>,
        texts: Vec<String>,
        metadatas: Vec<ChunkMeta>,
    ) -> Result<()>;
    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedChunk>>;
}

struct IndexEntry {
    id: String,
    text: String,
    metadata: ChunkMeta,
    embedding: Vec<f32>,
}

/// Brute-force cosine index held in memory.
pub struct InMemoryVectorIndex {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryVectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na * nb)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn index(
        &self,
        ids: Vec<String>,
        texts: Vec<String>,
        metadatas: Vec<ChunkMeta>,
    ) -> Result<()> {
        let embeddings = self.embedder.embed(texts.clone()).await?;
        let mut entries = self.entries.write().await;
        for (((id, text), metadata), embedding) in ids
            .into_iter()
            .zip(texts)
            .zip(metadatas)
            .zip(embeddings)
        {
            entries.push(IndexEntry {
                id,
                text,
                metadata,
                embedding,
            });
        }
        info!(total = entries.len(), "vector index updated");
        Ok(())
    }

    async fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = self
            .embedder
            .embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AssistError::Embedding("empty embedding batch".to_string()))?;

        let entries = self.entries.read().await;
        let mut hits: Vec<RetrievedChunk> = entries
            .iter()
            .map(|e| RetrievedChunk {
                id: e.id.clone(),
                text: e.text.clone(),
                metadata: e.metadata.clone(),
                distance: cosine_distance(&query_embedding, &e.embedding),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic stand-in: embeds each text as a fixed unit vector based
    /// on which marker word it contains.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("potassium") {
                        vec![1.0, 0.0, 0.0]
                    } else if t.contains("swelling") {
                        vec![0.7, 0.7, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    fn meta(page: u32) -> ChunkMeta {
        ChunkMeta {
            file: Some("ref".to_string()),
            page: Some(page),
            section: None,
        }
    }

    #[tokio::test]
    async fn query_orders_by_ascending_distance() {
        let index = InMemoryVectorIndex::new(Arc::new(KeywordEmbedder));
        index
            .index(
                vec!["a".into(), "b".into(), "c".into()],
                vec![
                    "diet low in potassium".into(),
                    "swelling in the legs".into(),
                    "unrelated appointment text".into(),
                ],
                vec![meta(1), meta(2), meta(3)],
            )
            .await
            .unwrap();
        assert_eq!(index.count().await.unwrap(), 3);

        let hits = index.query("potassium intake", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "a");
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn query_respects_top_k() {
        let index = InMemoryVectorIndex::new(Arc::new(KeywordEmbedder));
        index
            .index(
                vec!["a".into(), "b".into()],
                vec!["potassium".into(), "swelling".into()],
                vec![meta(1), meta(2)],
            )
            .await
            .unwrap();
        let hits = index.query("potassium", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn zero_norm_is_maximal_distance() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
