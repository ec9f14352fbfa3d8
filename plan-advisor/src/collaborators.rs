//! Seams to the slow, fallible outside world: text generation and document
//! retrieval. Both are called without holding any session lock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::{AdvisorError, Result};

/// Produces natural-language text from a prompt
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Best-matching snippet from a document collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub text: String,
    pub relevance_score: f64,
}

/// Looks up supporting text for a query in a named collection. Unknown
/// collections fail with [`AdvisorError::UnknownCollection`].
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, query: &str, collection: &str) -> Result<RetrievedContext>;
}

/// Run `call`, failing with [`AdvisorError::Timeout`] if it takes longer than `limit`.
pub async fn with_timeout<T, F>(operation: &str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AdvisorError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}

/// Generator used when no LLM is configured; every call fails so callers
/// take their degraded path.
pub struct UnavailableNarrator;

#[async_trait]
impl NarrativeGenerator for UnavailableNarrator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(AdvisorError::Narrative(
            "no narrative generator configured".to_string(),
        ))
    }
}

/// Retriever used when no vector store is configured.
pub struct UnavailableRetriever;

#[async_trait]
impl ContextRetriever for UnavailableRetriever {
    async fn retrieve(&self, _query: &str, _collection: &str) -> Result<RetrievedContext> {
        Err(AdvisorError::Retrieval(
            "no context retriever configured".to_string(),
        ))
    }
}
