//! Command handlers for the copra binary.

mod ingest;
mod serve;

pub use ingest::IngestCommand;
pub use serve::ServeCommand;

use copra_core::{AppConfig, AppError, AppResult};
use copra_rag::embeddings::{create_provider, EmbeddingProvider};
use copra_rag::PineconeIndex;
use std::sync::Arc;

/// Build the embedding provider from configuration.
pub(crate) fn build_embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(
        "openai",
        &config.embedding_model,
        Some(&config.openai_base_url),
        config.openai_api_key.as_deref(),
    )
}

/// Build the vector index client from configuration.
pub(crate) fn build_index(config: &AppConfig) -> AppResult<PineconeIndex> {
    let host = config
        .pinecone_host
        .as_deref()
        .ok_or_else(|| AppError::Config("PINECONE_HOST is not set".to_string()))?;
    let api_key = config
        .pinecone_api_key
        .as_deref()
        .ok_or_else(|| AppError::Config("PINECONE_API_KEY is not set".to_string()))?;

    Ok(PineconeIndex::new(host, api_key))
}
