//! Ingest command handler.
//!
//! Extracts, chunks, embeds, and uploads one policy document, replacing the
//! index contents.

use clap::Args;
use copra_core::{AppConfig, AppResult};
use copra_rag::ingest::{ingest_document, IngestOptions, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use std::path::PathBuf;

/// Ingest the policy document into the vector index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Document to ingest (.pdf, .txt or .md)
    pub path: PathBuf,

    /// Source label stored with every chunk
    #[arg(long, default_value = "8A Code of Practice")]
    pub source: String,

    /// Chunk size in words
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Overlap between chunks in words
    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    pub overlap: usize,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let embedder = super::build_embedder(config)?;
        let index = super::build_index(config)?;

        let options = IngestOptions {
            path: self.path.clone(),
            source_label: self.source.clone(),
            chunk_size: self.chunk_size,
            overlap: self.overlap,
        };

        let stats = ingest_document(embedder.as_ref(), &index, &options).await?;

        println!(
            "Ingested {} chunks ({} bytes) in {:.2}s",
            stats.chunks_count, stats.bytes_processed, stats.duration_secs
        );

        Ok(())
    }
}
