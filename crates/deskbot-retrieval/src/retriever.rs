//! Knowledge retriever port and implementations.
//!
//! - `HttpRetriever` queries the knowledge-retrieval service over HTTP and
//!   applies the configured relevance threshold. This is the production
//!   backend.
//! - `StaticRetriever` serves a fixed candidate set for testing.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use deskbot_core::config::RetrievalConfig;
use deskbot_core::types::Candidate;

use crate::error::RetrievalError;

/// Port for the knowledge retriever collaborator.
///
/// Given a question, returns zero or more labeled reference snippets judged
/// relevant by the retrieval backend. Relevance filtering happens here; the
/// policy engine trusts whatever survives.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Candidate>, RetrievalError>;
}

// ---------------------------------------------------------------------------
// HttpRetriever - production knowledge-service adapter
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    label: String,
    snippet: String,
    #[serde(default)]
    score: Option<f32>,
}

/// HTTP adapter for the knowledge-retrieval service.
pub struct HttpRetriever {
    client: reqwest::Client,
    search_url: String,
    search_k: usize,
    relevance_threshold: f32,
}

impl HttpRetriever {
    /// Build a retriever from the retrieval configuration section.
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            search_url: format!("{}/search", config.knowledge_url.trim_end_matches('/')),
            search_k: config.search_k,
            relevance_threshold: config.relevance_threshold,
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Candidate>, RetrievalError> {
        let response = self
            .client
            .post(&self.search_url)
            .json(&SearchRequest {
                query,
                k: self.search_k,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout
                } else {
                    RetrievalError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(RetrievalError::Unavailable(format!(
                "search returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;

        let raw_count = body.results.len();
        let candidates: Vec<Candidate> = body
            .results
            .into_iter()
            .filter_map(|hit| match hit.score {
                Some(score) if score >= self.relevance_threshold => {
                    Some(Candidate::new(hit.label, hit.snippet, score))
                }
                Some(_) => None,
                // Hits without a score are kept; the backend vouched for them.
                None => Some(Candidate::new(hit.label, hit.snippet, 1.0)),
            })
            .collect();

        debug!(
            query_len = query.len(),
            raw = raw_count,
            relevant = candidates.len(),
            "Retrieval complete"
        );

        Ok(candidates)
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Retriever that serves a fixed candidate set regardless of query.
pub struct StaticRetriever {
    candidates: Vec<Candidate>,
}

impl StaticRetriever {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    /// A retriever that never finds anything.
    pub fn empty() -> Self {
        Self { candidates: vec![] }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Candidate>, RetrievalError> {
        Ok(self.candidates.clone())
    }
}

/// Retriever that always fails, for exercising the degraded path.
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Candidate>, RetrievalError> {
        Err(RetrievalError::Unavailable("simulated outage".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_retriever_returns_fixed_set() {
        let retriever = StaticRetriever::new(vec![
            Candidate::new("Webmail", "Go to settings.", 0.9),
            Candidate::new("Outlook", "Open File > Options.", 0.8),
        ]);
        let results = retriever.retrieve("email signature").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "Webmail");
    }

    #[tokio::test]
    async fn test_static_retriever_empty() {
        let retriever = StaticRetriever::empty();
        let results = retriever.retrieve("anything").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_failing_retriever_errors() {
        let retriever = FailingRetriever;
        let err = retriever.retrieve("anything").await.unwrap_err();
        assert!(matches!(err, RetrievalError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_http_retriever_unreachable_backend() {
        // Port 9 (discard) refuses connections on any sane machine.
        let config = RetrievalConfig {
            knowledge_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..RetrievalConfig::default()
        };
        let retriever = HttpRetriever::new(&config).unwrap();
        let err = retriever.retrieve("anything").await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Unavailable(_) | RetrievalError::Timeout
        ));
    }

    #[test]
    fn test_search_url_normalizes_trailing_slash() {
        let config = RetrievalConfig {
            knowledge_url: "http://localhost:9000/".to_string(),
            ..RetrievalConfig::default()
        };
        let retriever = HttpRetriever::new(&config).unwrap();
        assert_eq!(retriever.search_url, "http://localhost:9000/search");
    }

    #[test]
    fn test_search_hit_decodes_without_score() {
        let json = r#"{"results":[{"label":"Webmail","snippet":"text"}]}"#;
        let body: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.results.len(), 1);
        assert!(body.results[0].score.is_none());
    }
}
