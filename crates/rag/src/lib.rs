//! Retrieval-augmented question answering over a policy document.
//!
//! This crate implements the retrieval pipeline: query expansion, multi-query
//! vector search, deduplication, adaptive score-threshold relaxation, and
//! capped chunk selection with source attribution. It also provides answer
//! synthesis via an LLM and the ingestion pipeline that feeds the index.

pub mod attribute;
pub mod chat;
pub mod embeddings;
pub mod expand;
pub mod filter;
pub mod index;
pub mod ingest;
pub mod merge;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chat::{ChatOutcome, Chatbot};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use expand::QueryExpander;
pub use filter::FilterPolicy;
pub use index::{PineconeIndex, UpsertVector, VectorIndex};
pub use retriever::{Retriever, RetrieverConfig};
pub use types::{MatchMetadata, RetrievalResult, ScoredMatch, SourceInfo};
