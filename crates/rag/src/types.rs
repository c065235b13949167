//! Retrieval pipeline type definitions.

use serde::{Deserialize, Serialize};

/// Metadata bag carried by an indexed chunk.
///
/// The well-known fields default to empty strings when the index returns a
/// match without them; anything else the index stored is preserved verbatim
/// in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Chunk text content
    #[serde(default)]
    pub text: String,

    /// Source document label
    #[serde(default)]
    pub source: String,

    /// Free-text note attached at ingestion time
    #[serde(default)]
    pub notes: String,

    /// Any further metadata fields, carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MatchMetadata {
    /// Metadata for a freshly ingested chunk.
    pub fn new(
        text: impl Into<String>,
        source: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            notes: notes.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A single scored candidate produced by one vector-search call.
///
/// Ephemeral: exists only within one retrieval invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    /// Unique identifier assigned at ingestion time
    pub id: String,

    /// Similarity score; higher is more relevant
    pub score: f32,

    /// Metadata stored alongside the vector
    #[serde(default)]
    pub metadata: MatchMetadata,
}

/// Structured citation for one retained chunk.
///
/// At most one of `section` and `page` is populated; section wins when both
/// could be derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Human-readable chunk label (e.g., "Chunk 12")
    pub id: String,

    /// Source document label
    pub source: String,

    /// Section locator (e.g., "4.2.1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Page locator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Free-text note carried from ingestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Final output of one retrieval invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Retained chunk texts, best first
    pub chunks: Vec<String>,

    /// Citation metadata parallel to `chunks`
    pub chunk_sources: Vec<SourceInfo>,

    /// Representative score: the top score, or 0.0 when nothing was retained
    pub retrieval_score: f32,

    /// Distinct source labels, comma-joined
    pub source: String,

    /// Distinct notes, semicolon-joined
    pub notes: String,
}

impl RetrievalResult {
    /// Result for a query the index had nothing for.
    pub fn empty() -> Self {
        Self::default()
    }
}
