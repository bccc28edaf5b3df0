//! Clinical question-answering agent.
//!
//! Grounds its reply in retrieved reference chunks; falls back to a single
//! web search when retrieval comes up empty, and to a fixed apology when the
//! web does too. One best-effort attempt per branch, nothing cached.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::audit::AuditLog;
use crate::citations::{citation_for, inline_citations};
use crate::error::Result;
use crate::models::{Citation, RetrievedChunk};
use crate::retriever::Retriever;
use crate::web_search::WebSearch;

pub const NO_ANSWER_APOLOGY: &str =
    "I'm sorry, I couldn't find relevant information. Please consult your provider.";

#[derive(Debug, Clone)]
pub struct ClinicalAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub retrieved_chunks: Vec<RetrievedChunk>,
}

impl ClinicalAnswer {
    fn ungrounded(answer: String) -> Self {
        Self {
            answer,
            citations: Vec::new(),
            retrieved_chunks: Vec::new(),
        }
    }
}

pub struct ClinicalAgent {
    retriever: Arc<Retriever>,
    web: Arc<dyn WebSearch>,
    audit: Arc<dyn AuditLog>,
    web_results: usize,
}

impl ClinicalAgent {
    pub fn new(
        retriever: Arc<Retriever>,
        web: Arc<dyn WebSearch>,
        audit: Arc<dyn AuditLog>,
        web_results: usize,
    ) -> Self {
        Self {
            retriever,
            web,
            audit,
            web_results,
        }
    }

    pub async fn handle(&self, message: &str) -> Result<ClinicalAnswer> {
        let retrieved = self.retriever.retrieve(message, None).await?;

        if !retrieved.is_empty() {
            let citations: Vec<Citation> = retrieved.iter().map(citation_for).collect();
            let snippets = retrieved
                .iter()
                .take(3)
                .map(|r| r.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let inline = inline_citations(&citations);
            let answer = format!(
                "Based on nephrology reference {inline}:\n{snippets}\n\nLet me know if you want more detail or guidance tailored to your meds and labs."
            );
            self.audit.agent_event(json!({
                "type": "rag_query",
                "results": retrieved.len(),
            }));
            info!(results = retrieved.len(), "answer grounded in reference");
            return Ok(ClinicalAnswer {
                answer,
                citations,
                retrieved_chunks: retrieved,
            });
        }

        let web = self.web.search(message, self.web_results).await?;
        if let Some(top) = web.first() {
            self.audit.agent_event(json!({
                "type": "web_search",
                "results": web.len(),
            }));
            info!(results = web.len(), "falling back to web search");
            return Ok(ClinicalAnswer::ungrounded(format!(
                "I couldn't find this in the nephrology reference. Here's something relevant online: {} ({}).",
                top.title, top.url
            )));
        }

        Ok(ClinicalAnswer::ungrounded(NO_ANSWER_APOLOGY.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NullAuditLog;
    use crate::models::{ChunkMeta, WebSearchResult};
    use crate::vector_index::VectorIndex;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct FixedIndex {
        hits: Vec<RetrievedChunk>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn count(&self) -> Result<usize> {
            Ok(self.hits.len().max(1))
        }

        async fn index(
            &self,
            _ids: Vec<String>,
            _texts: Vec<String>,
            _metadatas: Vec<ChunkMeta>,
        ) -> Result<()> {
            Ok(())
        }

        async fn query(&self, _text: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
            let mut hits = self.hits.clone();
            hits.truncate(top_k);
            Ok(hits)
        }
    }

    struct FixedWeb {
        results: Vec<WebSearchResult>,
    }

    #[async_trait]
    impl crate::web_search::WebSearch for FixedWeb {
        async fn search(&self, _query: &str, max: usize) -> Result<Vec<WebSearchResult>> {
            let mut r = self.results.clone();
            r.truncate(max);
            Ok(r)
        }
    }

    fn hit(id: &str, section: Option<&str>, page: Option<u32>, text: &str, d: f32) -> RetrievedChunk {
        RetrievedChunk {
            id: id.to_string(),
            text: text.to_string(),
            metadata: ChunkMeta {
                file: Some("ref".to_string()),
                page,
                section: section.map(str::to_string),
            },
            distance: d,
        }
    }

    fn agent(hits: Vec<RetrievedChunk>, web: Vec<WebSearchResult>) -> ClinicalAgent {
        let retriever = Arc::new(Retriever::new(
            Arc::new(FixedIndex { hits }),
            PathBuf::from("/nonexistent/chunks.json"),
            4,
        ));
        ClinicalAgent::new(
            retriever,
            Arc::new(FixedWeb { results: web }),
            Arc::new(NullAuditLog),
            5,
        )
    }

    #[tokio::test]
    async fn grounded_answer_carries_citations_and_snippets() {
        let agent = agent(
            vec![
                hit("a", Some("Diet"), Some(3), "Limit potassium intake.", 0.1),
                hit("b", None, Some(7), "Avoid salt substitutes.", 0.2),
                hit("c", None, None, "Track fluid intake.", 0.3),
                hit("d", Some("Hidden"), Some(9), "Fourth chunk not inlined.", 0.4),
            ],
            vec![],
        );
        let answer = agent.handle("potassium and diet").await.unwrap();
        assert!(answer.answer.starts_with(
            "Based on nephrology reference [Diet; p. 3], [p. 7], [reference]:"
        ));
        assert!(answer.answer.contains("Limit potassium intake."));
        assert!(answer.answer.contains("Avoid salt substitutes."));
        // Only the first three chunks are quoted, but all are cited.
        assert!(!answer.answer.contains("Fourth chunk not inlined."));
        assert_eq!(answer.citations.len(), 4);
        assert_eq!(answer.retrieved_chunks.len(), 4);
        assert_eq!(answer.citations[0].score, Some(0.1));
    }

    #[tokio::test]
    async fn empty_retrieval_falls_back_to_web() {
        let agent = agent(
            vec![],
            vec![WebSearchResult {
                title: "Potassium and CKD".to_string(),
                url: "https://example.org/ckd".to_string(),
                snippet: None,
            }],
        );
        let answer = agent.handle("potassium").await.unwrap();
        assert!(answer.answer.contains("couldn't find this in the nephrology reference"));
        assert!(answer.answer.contains("Potassium and CKD"));
        assert!(answer.answer.contains("https://example.org/ckd"));
        assert!(answer.citations.is_empty());
    }

    #[tokio::test]
    async fn empty_web_yields_fixed_apology() {
        let agent = agent(vec![], vec![]);
        let answer = agent.handle("potassium").await.unwrap();
        assert_eq!(answer.answer, NO_ANSWER_APOLOGY);
        assert!(answer.citations.is_empty());
        assert!(answer.retrieved_chunks.is_empty());
    }
}
