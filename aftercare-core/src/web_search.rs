//! Keyword web search fallback.
//!
//! Queries the DuckDuckGo instant-answer API directly; no key required. Sits
//! behind a trait so the clinical agent can be tested without network access.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AssistError, Result};
use crate::models::WebSearchResult;

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebSearchResult>>;
}

pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("aftercare/0.1")
            .build()
            .map_err(|e| AssistError::WebSearchUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: "https://api.duckduckgo.com".to_string(),
        })
    }

    #[cfg(test)]
    fn with_endpoint(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

fn first_sentence(text: &str) -> &str {
    text.split(" - ").next().unwrap_or(text)
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebSearchResult>> {
        let url = format!(
            "{}/?q={}&format=json&no_html=1&skip_disambig=1",
            self.endpoint,
            urlencoding::encode(query)
        );

        let body: Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssistError::WebSearchUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| AssistError::WebSearchUnavailable(e.to_string()))?;

        let mut results = Vec::new();

        // Main abstract, when present.
        if let Some(abstract_text) = body.get("AbstractText").and_then(|v| v.as_str()) {
            if !abstract_text.is_empty() {
                let title = body
                    .get("Heading")
                    .and_then(|v| v.as_str())
                    .filter(|h| !h.is_empty())
                    .unwrap_or(query);
                let url = body
                    .get("AbstractURL")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                results.push(WebSearchResult {
                    title: title.to_string(),
                    url: url.to_string(),
                    snippet: Some(abstract_text.to_string()),
                });
            }
        }

        // Related topics fill the remainder.
        if let Some(topics) = body.get("RelatedTopics").and_then(|v| v.as_array()) {
            for topic in topics {
                if results.len() >= max_results {
                    break;
                }
                let Some(text) = topic.get("Text").and_then(|v| v.as_str()) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                let url = topic
                    .get("FirstURL")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                results.push(WebSearchResult {
                    title: first_sentence(text).to_string(),
                    url: url.to_string(),
                    snippet: Some(text.to_string()),
                });
            }
        }

        results.truncate(max_results);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sentence_takes_leading_segment() {
        assert_eq!(
            first_sentence("Potassium - a chemical element"),
            "Potassium"
        );
        assert_eq!(first_sentence("No separator here"), "No separator here");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_collaborator_failure() {
        let search = DuckDuckGoSearch::with_endpoint("http://127.0.0.1:1".to_string());
        let err = search.search("potassium", 3).await.unwrap_err();
        assert!(matches!(err, AssistError::WebSearchUnavailable(_)));
    }
}
