//! Retrieval orchestration.
//!
//! Sequences query expansion, per-variation embedding and vector search,
//! merging, adaptive filtering, and source attribution into a single
//! `RetrievalResult`. All collaborators are injected at construction time so
//! tests can substitute fakes.

use crate::attribute::attribute;
use crate::embeddings::EmbeddingProvider;
use crate::expand::QueryExpander;
use crate::filter::FilterPolicy;
use crate::index::VectorIndex;
use crate::merge::merge_matches;
use crate::types::{RetrievalResult, ScoredMatch};
use copra_core::{AppError, AppResult};
use std::sync::Arc;

/// Tuning knobs for the retrieval pipeline.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Candidates requested per vector-search call. Must be positive.
    pub top_k: usize,

    /// Threshold relaxation policy
    pub filter: FilterPolicy,

    /// Whether to generate query variations before searching
    pub enable_query_expansion: bool,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: copra_core::config::DEFAULT_TOP_K,
            filter: FilterPolicy::default(),
            enable_query_expansion: true,
        }
    }
}

/// Retrieval pipeline coordinator.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    expander: Option<QueryExpander>,
    config: RetrieverConfig,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        expander: Option<QueryExpander>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            expander,
            config,
        }
    }

    /// Retrieve the most relevant chunks for a query.
    ///
    /// Each query variation is embedded and searched independently and
    /// concurrently; a variation that fails is skipped with a warning. Only
    /// when every variation fails does the retrieval itself error. An index
    /// that genuinely has nothing yields an empty result with a zero score.
    pub async fn retrieve(&self, query: &str) -> AppResult<RetrievalResult> {
        tracing::info!("Original query: {}", query);

        let variations = match (&self.expander, self.config.enable_query_expansion) {
            (Some(expander), true) => expander.expand(query).await,
            _ => vec![query.to_string()],
        };
        tracing::info!("Query variations: {:?}", variations);

        let searches = variations.iter().map(|variation| {
            let variation = variation.clone();
            async move {
                let embedding = self.embedder.embed(&variation).await?;
                self.index.query(&embedding, self.config.top_k).await
            }
        });

        let outcomes = futures::future::join_all(searches).await;

        let mut result_sets: Vec<Vec<ScoredMatch>> = Vec::new();
        let mut failed = 0usize;
        for (variation, outcome) in variations.iter().zip(outcomes) {
            match outcome {
                Ok(matches) => result_sets.push(matches),
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Skipping query variation {:?}: {}", variation, e);
                }
            }
        }

        if result_sets.is_empty() {
            return Err(AppError::Retrieval(format!(
                "All {} query variations failed to embed or search",
                failed
            )));
        }

        let unique = merge_matches(result_sets);
        tracing::info!("Total unique matches returned: {}", unique.len());

        let filtered = self.config.filter.apply(&unique);

        Ok(assemble(&filtered))
    }
}

/// Assemble the final result from the filtered working set.
///
/// Matches whose trimmed text is empty carry nothing usable and are dropped
/// from the chunk list without error.
fn assemble(filtered: &[ScoredMatch]) -> RetrievalResult {
    let retrieval_score = filtered.first().map(|m| m.score).unwrap_or(0.0);

    let mut chunks = Vec::new();
    let mut chunk_sources = Vec::new();
    let mut sources: Vec<String> = Vec::new();
    let mut notes: Vec<String> = Vec::new();

    for (position, m) in filtered.iter().enumerate() {
        let text = m.metadata.text.trim();
        if text.is_empty() {
            continue;
        }

        let info = attribute(m, position);

        if !sources.contains(&info.source) {
            sources.push(info.source.clone());
        }
        if let Some(note) = &info.note {
            if !notes.contains(note) {
                notes.push(note.clone());
            }
        }

        chunks.push(text.to_string());
        chunk_sources.push(info);
    }

    RetrievalResult {
        chunks,
        chunk_sources,
        retrieval_score,
        source: sources.join(", "),
        notes: notes.join("; "),
    }
}
