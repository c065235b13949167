//! Embedding generation for queries and ingested chunks.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
