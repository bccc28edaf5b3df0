//! Retrieval over the vector index, with lazy one-time population from a
//! chunk source.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Chunk, ChunkMeta, RetrievedChunk};
use crate::vector_index::VectorIndex;

pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    chunks_path: PathBuf,
    default_top_k: usize,
    bootstrap: OnceCell<()>,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, chunks_path: PathBuf, default_top_k: usize) -> Self {
        Self {
            index,
            chunks_path,
            default_top_k,
            bootstrap: OnceCell::new(),
        }
    }

    /// Populates the index from the chunk source if it holds nothing yet.
    /// Runs at most once per retriever; a no-op when the index already has
    /// content or no source file exists.
    async fn ensure_index_built(&self) -> Result<()> {
        self.bootstrap
            .get_or_try_init(|| async {
                if self.index.count().await? > 0 {
                    return Ok(());
                }
                if !self.chunks_path.exists() {
                    warn!(path = %self.chunks_path.display(), "no chunk source; index stays empty");
                    return Ok(());
                }
                let raw = tokio::fs::read_to_string(&self.chunks_path).await?;
                let records: Vec<Chunk> = serde_json::from_str(&raw)?;

                let mut ids = Vec::with_capacity(records.len());
                let mut texts = Vec::with_capacity(records.len());
                let mut metadatas = Vec::with_capacity(records.len());
                for record in records {
                    ids.push(record.id);
                    texts.push(record.text);
                    metadatas.push(ChunkMeta {
                        file: Some(record.file),
                        page: Some(record.page),
                        section: record.section,
                    });
                }
                if !texts.is_empty() {
                    let count = texts.len();
                    self.index.index(ids, texts, metadatas).await?;
                    info!(count, "vector index populated from chunk source");
                }
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Returns up to `top_k` chunks ordered by the index's ascending
    /// distance; the ordering is taken as-is, never re-sorted.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<RetrievedChunk>> {
        self.ensure_index_built().await?;
        let k = top_k.unwrap_or(self.default_top_k);
        self.index.query(query, k).await
    }
}
