//! Document ingestion: text extraction, chunking, and index upload.
//!
//! Feeds the vector index that retrieval reads from. Ingestion owns the
//! index's bulk-write surface; it clears the index and re-uploads the whole
//! document.

use crate::embeddings::EmbeddingProvider;
use crate::index::{UpsertVector, VectorIndex};
use crate::types::MatchMetadata;
use copra_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use uuid::Uuid;

/// Default chunk size in words.
pub const DEFAULT_CHUNK_SIZE: usize = 150;

/// Default overlap between chunks in words.
pub const DEFAULT_OVERLAP: usize = 50;

/// Vectors per upsert request.
const UPSERT_BATCH_SIZE: usize = 50;

/// Options for the ingest operation.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Document to ingest (.pdf, .txt or .md)
    pub path: PathBuf,

    /// Source label stored with every chunk
    pub source_label: String,

    /// Chunk size in words
    pub chunk_size: usize,

    /// Overlap between chunks in words
    pub overlap: usize,
}

impl IngestOptions {
    pub fn new(path: impl Into<PathBuf>, source_label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_label: source_label.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Summary of a completed ingest operation.
#[derive(Debug, Clone)]
pub struct IngestStats {
    pub chunks_count: usize,
    pub bytes_processed: u64,
    pub duration_secs: f64,
}

/// Ingest one document: extract, chunk, embed, and upload.
pub async fn ingest_document(
    embedder: &dyn EmbeddingProvider,
    index: &dyn VectorIndex,
    options: &IngestOptions,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    let text = extract_text(&options.path)?;
    let bytes_processed = text.len() as u64;

    let chunks = chunk_text(&text, options.chunk_size, options.overlap);
    if chunks.is_empty() {
        return Err(AppError::Ingest(format!(
            "Document {:?} produced no chunks",
            options.path
        )));
    }

    tracing::info!(
        "Uploading {} chunks to the index in batches of {}",
        chunks.len(),
        UPSERT_BATCH_SIZE
    );

    // A failed clear is survivable: upserts overwrite matching ids.
    if let Err(e) = index.delete_all().await {
        tracing::warn!("Failed to clear index: {}. Proceeding with upsert.", e);
    }

    let mut chunks_count = 0usize;

    for (batch_no, batch) in chunks.chunks(UPSERT_BATCH_SIZE).enumerate() {
        let embeddings = embedder.embed_batch(batch).await?;

        let vectors: Vec<UpsertVector> = batch
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(j, (chunk, values))| {
                let i = batch_no * UPSERT_BATCH_SIZE + j;
                UpsertVector {
                    id: format!("chunk_{}_{}", i, Uuid::new_v4()),
                    values,
                    metadata: MatchMetadata::new(
                        chunk.clone(),
                        options.source_label.clone(),
                        format!("Chunk {}", i + 1),
                    ),
                }
            })
            .collect();

        index.upsert(&vectors).await?;
        chunks_count += vectors.len();

        tracing::info!("Uploaded batch {} ({} chunks)", batch_no + 1, vectors.len());
    }

    Ok(IngestStats {
        chunks_count,
        bytes_processed,
        duration_secs: start.elapsed().as_secs_f64(),
    })
}

/// Read a document's text content.
///
/// PDFs go through the `pdftotext` binary; anything else is read as plain
/// text.
pub fn extract_text(path: &Path) -> AppResult<String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => extract_pdf_text(path),
        _ => Ok(std::fs::read_to_string(path)?),
    }
}

fn extract_pdf_text(path: &Path) -> AppResult<String> {
    tracing::info!("Extracting PDF text using pdftotext");

    let output = Command::new("pdftotext")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| {
            AppError::Ingest(format!(
                "pdftotext command failed: {} (is poppler installed?)",
                e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Ingest(format!(
            "pdftotext failed: {}",
            stderr.trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();
    if text.trim().is_empty() {
        return Err(AppError::Ingest(
            "pdftotext produced no text output".to_string(),
        ));
    }

    Ok(text)
}

/// Sentence-aware word chunking.
///
/// Sentences are accumulated into chunks of up to `chunk_size` words.
/// Sentences longer than a whole chunk are segmented with `overlap` words
/// carried between segments for context continuity.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for sentence in split_sentences(text) {
        let words: Vec<String> = sentence
            .split_whitespace()
            .map(str::to_string)
            .collect();

        if current.len() + words.len() <= chunk_size {
            current.extend(words);
            continue;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
            if overlap > 0 && current.len() > overlap {
                current = current.split_off(current.len() - overlap);
            } else {
                current.clear();
            }
        }

        if words.len() > chunk_size {
            // Segment the over-long sentence directly
            let step = chunk_size.saturating_sub(overlap).max(1);
            let mut i = 0;
            while i < words.len() {
                let end = (i + chunk_size).min(words.len());
                chunks.push(words[i..end].join(" "));
                if overlap > 0 && i + chunk_size < words.len() {
                    current = words[end - overlap..end].to_vec();
                }
                i += step;
            }
        } else {
            current = words;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

/// Split text at sentence terminators followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let sentence = current.trim().to_string();
    if !sentence.is_empty() {
        sentences.push(sentence);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use crate::types::ScoredMatch;
    use std::io::Write;
    use std::sync::Mutex;

    /// In-memory index capturing writes.
    #[derive(Default)]
    struct RecordingIndex {
        vectors: Mutex<Vec<UpsertVector>>,
        cleared: Mutex<bool>,
    }

    #[async_trait::async_trait]
    impl VectorIndex for RecordingIndex {
        async fn query(&self, _vector: &[f32], _top_k: usize) -> AppResult<Vec<ScoredMatch>> {
            Ok(Vec::new())
        }

        async fn upsert(&self, vectors: &[UpsertVector]) -> AppResult<()> {
            self.vectors.lock().unwrap().extend_from_slice(vectors);
            Ok(())
        }

        async fn delete_all(&self) -> AppResult<()> {
            *self.cleared.lock().unwrap() = true;
            Ok(())
        }
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("First rule. Second rule! Third rule? Fourth");
        assert_eq!(
            sentences,
            vec!["First rule.", "Second rule!", "Third rule?", "Fourth"]
        );
    }

    #[test]
    fn test_split_sentences_keeps_inline_dots() {
        // Terminators not followed by whitespace do not split
        let sentences = split_sentences("See section 3.2.1 for details. Next sentence.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "See section 3.2.1 for details.");
    }

    #[test]
    fn test_chunk_text_packs_sentences() {
        let text = "one two three. four five six. seven eight nine.";
        let chunks = chunk_text(text, 6, 0);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "one two three. four five six.");
        assert_eq!(chunks[1], "seven eight nine.");
    }

    #[test]
    fn test_chunk_text_segments_long_sentence() {
        let words: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, 8, 2);

        // Stepping by chunk_size - overlap = 6 words
        assert!(chunks.len() >= 3);
        assert!(chunks[0].starts_with("w0"));
        assert!(chunks[1].starts_with("w6"));
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 150, 50).is_empty());
        assert!(chunk_text("some words here", 0, 0).is_empty());
    }

    #[test]
    fn test_extract_text_plain_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "policy text").unwrap();

        let text = extract_text(file.path()).unwrap();
        assert_eq!(text, "policy text");
    }

    #[tokio::test]
    async fn test_ingest_document_uploads_all_chunks() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let body = (0..40)
            .map(|i| format!("Sentence number {} about research degrees.", i))
            .collect::<Vec<_>>()
            .join(" ");
        write!(file, "{}", body).unwrap();

        let embedder = MockProvider::new(64);
        let index = RecordingIndex::default();
        let options = IngestOptions {
            path: file.path().to_path_buf(),
            source_label: "8A Code of Practice".to_string(),
            chunk_size: 30,
            overlap: 5,
        };

        let stats = ingest_document(&embedder, &index, &options).await.unwrap();

        assert!(*index.cleared.lock().unwrap());
        let vectors = index.vectors.lock().unwrap();
        assert_eq!(vectors.len(), stats.chunks_count);
        assert!(stats.chunks_count > 1);

        // Ids carry the chunk number; metadata carries text, source, note
        assert!(vectors[0].id.starts_with("chunk_0_"));
        assert_eq!(vectors[0].metadata.source, "8A Code of Practice");
        assert_eq!(vectors[0].metadata.notes, "Chunk 1");
        assert!(!vectors[0].metadata.text.is_empty());
        assert_eq!(vectors[0].values.len(), 64);
    }

    #[tokio::test]
    async fn test_ingest_missing_file_errors() {
        let embedder = MockProvider::new(8);
        let index = RecordingIndex::default();
        let options = IngestOptions::new("/nonexistent/file.txt", "doc");

        let result = ingest_document(&embedder, &index, &options).await;
        assert!(result.is_err());
    }
}
