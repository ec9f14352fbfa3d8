//! Context retrieval from Pinecone indexes with integrated embedding.
//!
//! Each plan's documents live in their own index. The index host is looked up
//! once through the control plane and cached; queries are sent as plain text
//! and embedded server-side.

use async_trait::async_trait;
use dashmap::DashMap;
use plan_advisor::{AdvisorError, CATALOG, ContextRetriever, Result, RetrievedContext};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

const CONTROL_PLANE: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2025-01";

pub struct PineconeRetriever {
    http: Client,
    api_key: String,
    namespace: String,
    hosts: DashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: SearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_score", default)]
    score: f64,
    #[serde(default)]
    fields: HitFields,
}

#[derive(Debug, Default, Deserialize)]
struct HitFields {
    #[serde(default)]
    text: String,
}

impl PineconeRetriever {
    pub fn new(api_key: &str, namespace: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            namespace: namespace.to_string(),
            hosts: DashMap::new(),
        })
    }

    async fn index_host(&self, collection: &str) -> Result<String> {
        if let Some(host) = self.hosts.get(collection) {
            return Ok(host.clone());
        }

        let url = format!("{}/indexes/{}", CONTROL_PLANE, collection);
        let response = self
            .http
            .get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(retrieval_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AdvisorError::UnknownCollection(collection.to_string()));
        }
        let description: IndexDescription = response
            .error_for_status()
            .map_err(retrieval_error)?
            .json()
            .await
            .map_err(retrieval_error)?;

        info!(collection = %collection, host = %description.host, "Resolved index host");
        self.hosts
            .insert(collection.to_string(), description.host.clone());
        Ok(description.host)
    }
}

#[async_trait]
impl ContextRetriever for PineconeRetriever {
    async fn retrieve(&self, query: &str, collection: &str) -> Result<RetrievedContext> {
        if !CATALOG.iter().any(|plan| plan.collection == collection) {
            return Err(AdvisorError::UnknownCollection(collection.to_string()));
        }

        let host = self.index_host(collection).await?;
        let url = search_url(&host, &self.namespace);
        let body = json!({
            "query": {
                "inputs": { "text": query },
                "top_k": 1
            },
            "fields": ["text"]
        });

        debug!(collection = %collection, "Searching plan documents");
        let response: SearchResponse = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(retrieval_error)?
            .error_for_status()
            .map_err(retrieval_error)?
            .json()
            .await
            .map_err(retrieval_error)?;

        Ok(best_hit(response))
    }
}

fn search_url(host: &str, namespace: &str) -> String {
    let host = host
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{}/records/namespaces/{}/search", host, namespace)
}

fn best_hit(response: SearchResponse) -> RetrievedContext {
    match response.result.hits.into_iter().next() {
        Some(hit) => RetrievedContext {
            text: hit.fields.text,
            relevance_score: hit.score,
        },
        None => RetrievedContext::default(),
    }
}

fn retrieval_error(e: reqwest::Error) -> AdvisorError {
    AdvisorError::Retrieval(e.to_string())
}
