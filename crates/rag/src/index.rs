//! Vector index abstraction and Pinecone-compatible client.
//!
//! The index is an external, network-hosted service: retrieval only reads
//! from it, while the ingestion pipeline owns the bulk-write surface.

use crate::types::{MatchMetadata, ScoredMatch};
use copra_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum request attempts (initial try plus one bounded retry).
const MAX_ATTEMPTS: u32 = 2;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A vector with metadata, ready to be written to the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertVector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: MatchMetadata,
}

/// Trait for vector index backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Search for the top-k most similar vectors.
    ///
    /// Returns matches in the index's own relevance order (descending score)
    /// with their metadata bags carried verbatim.
    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredMatch>>;

    /// Insert or update a batch of vectors. Ingestion only.
    async fn upsert(&self, vectors: &[UpsertVector]) -> AppResult<()>;

    /// Remove every vector from the index. Ingestion only.
    async fn delete_all(&self) -> AppResult<()>;
}

/// Pinecone data-plane query request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

/// Pinecone data-plane query response.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredMatch>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [UpsertVector],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest {
    delete_all: bool,
}

/// Client for a Pinecone-compatible vector index over its data-plane REST
/// API.
pub struct PineconeIndex {
    /// Index host URL (e.g., "https://myindex-abc123.svc.pinecone.io")
    host: String,

    /// API key sent in the `Api-Key` header
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl PineconeIndex {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// POST a JSON payload to the index, retrying once on failure.
    async fn post_json<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> AppResult<reqwest::Response> {
        let url = format!("{}{}", self.host, path);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < MAX_ATTEMPTS {
            let result = self
                .client
                .post(&url)
                .header("Api-Key", &self.api_key)
                .json(payload)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    last_error = Some(AppError::Index(format!(
                        "Index API error ({}): {}",
                        status, error_text
                    )));
                }
                Err(e) => {
                    last_error = Some(AppError::Index(format!(
                        "Failed to reach index at {}: {}",
                        url, e
                    )));
                }
            }

            attempt += 1;
            if attempt < MAX_ATTEMPTS {
                let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                warn!(
                    "Index request failed (attempt {}/{}), retrying in {}ms",
                    attempt, MAX_ATTEMPTS, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::Index("Unknown index error".to_string())))
    }
}

#[async_trait::async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> AppResult<Vec<ScoredMatch>> {
        debug!("Querying index for top {} matches", top_k);

        let payload = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
        };

        let response = self.post_json("/query", &payload).await?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("Failed to parse query response: {}", e)))?;

        debug!("Index returned {} matches", body.matches.len());
        Ok(body.matches)
    }

    async fn upsert(&self, vectors: &[UpsertVector]) -> AppResult<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        let payload = UpsertRequest { vectors };
        self.post_json("/vectors/upsert", &payload).await?;
        Ok(())
    }

    async fn delete_all(&self) -> AppResult<()> {
        let payload = DeleteRequest { delete_all: true };
        self.post_json("/vectors/delete", &payload).await?;
        Ok(())
    }
}
