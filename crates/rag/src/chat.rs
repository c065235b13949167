//! Answer synthesis over retrieved context.
//!
//! Builds the numbered-context prompt from a retrieval result and asks the
//! chat model for a concise answer. A completion failure never escapes this
//! boundary: it becomes a placeholder answer so the response shape stays
//! intact.

use crate::retriever::Retriever;
use crate::types::{RetrievalResult, SourceInfo};
use copra_core::AppResult;
use copra_llm::{ChatClient, ChatRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token limit for the generated answer.
const ANSWER_MAX_TOKENS: u32 = 350;

const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful assistant specifically trained to \
provide CONCISE answers about Bournemouth University's Code of Practice for Research \
Degrees. Prioritize brevity and clarity over comprehensiveness. Keep responses short and \
focused on the main points.";

/// Everything a chat turn produces: the synthesized answer plus the
/// retrieval metadata it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub answer: String,
    pub chunks: Vec<String>,
    pub chunk_sources: Vec<SourceInfo>,
    pub retrieval_score: f32,
    pub source: String,
    pub notes: String,
}

/// Retrieval-grounded question answering.
pub struct Chatbot {
    retriever: Retriever,
    client: Arc<dyn ChatClient>,
    model: String,
}

impl Chatbot {
    pub fn new(retriever: Retriever, client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            retriever,
            client,
            model: model.into(),
        }
    }

    /// Answer a question about the policy document.
    ///
    /// Retrieval failures propagate (the caller gets an explicit error
    /// rather than an empty answer); completion failures are converted into
    /// a placeholder answer carrying the error text, with the retrieval
    /// metadata intact.
    pub async fn respond(&self, query: &str) -> AppResult<ChatOutcome> {
        let retrieval = self.retriever.retrieve(query).await?;

        let context = build_context(&retrieval);
        let prompt = build_question_prompt(query, &context);

        let request = ChatRequest::new(&self.model)
            .with_system(ANSWER_SYSTEM_PROMPT)
            .with_user(prompt)
            .with_max_tokens(ANSWER_MAX_TOKENS);

        let answer = match self.client.complete(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                tracing::error!("Error generating response: {}", e);
                format!("Error generating response: {}", e)
            }
        };

        tracing::info!(
            "Retrieved {} chunks (score {:.4}) for query: {:.50}",
            retrieval.chunks.len(),
            retrieval.retrieval_score,
            query
        );

        Ok(ChatOutcome {
            answer,
            chunks: retrieval.chunks,
            chunk_sources: retrieval.chunk_sources,
            retrieval_score: retrieval.retrieval_score,
            source: retrieval.source,
            notes: retrieval.notes,
        })
    }
}

/// Render retrieved chunks as numbered context blocks.
///
/// Each block is headed `Context N`, annotated with the chunk's section or
/// page locator when one was attributed.
fn build_context(result: &RetrievalResult) -> String {
    if result.chunks.is_empty() {
        return "No relevant context found.".to_string();
    }

    result
        .chunks
        .iter()
        .zip(result.chunk_sources.iter())
        .enumerate()
        .map(|(i, (chunk, info))| {
            let mut header = format!("Context {}", i + 1);
            if let Some(section) = &info.section {
                header.push_str(&format!(" (Section {})", section));
            } else if let Some(page) = &info.page {
                header.push_str(&format!(" (Page {})", page));
            }
            format!("{}: {}", header, chunk)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_question_prompt(query: &str, context: &str) -> String {
    format!(
        "Answer the following question about the Code of Practice for Research Degrees.\n\
         \n\
         Question: {}\n\
         \n\
         Here is the relevant context from the document:\n\
         {}\n\
         \n\
         Instructions:\n\
         1. Provide a CONCISE answer (3-5 sentences if possible) based ONLY on the provided context.\n\
         2. Format the answer for readability using bullet points where appropriate.\n\
         3. If the context doesn't contain enough information, briefly state what's missing.\n\
         4. Reference specific contexts by their numbers (e.g., \"According to Context 3...\").\n\
         5. Focus on giving the most important information first.",
        query, context
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(section: Option<&str>, page: Option<&str>) -> SourceInfo {
        SourceInfo {
            id: "Chunk 1".to_string(),
            source: "doc".to_string(),
            section: section.map(str::to_string),
            page: page.map(str::to_string),
            note: None,
        }
    }

    #[test]
    fn test_build_context_empty() {
        let result = RetrievalResult::empty();
        assert_eq!(build_context(&result), "No relevant context found.");
    }

    #[test]
    fn test_build_context_numbers_chunks() {
        let result = RetrievalResult {
            chunks: vec!["first".to_string(), "second".to_string()],
            chunk_sources: vec![info(None, None), info(None, None)],
            retrieval_score: 0.8,
            source: "doc".to_string(),
            notes: String::new(),
        };

        let context = build_context(&result);
        assert!(context.contains("Context 1: first"));
        assert!(context.contains("Context 2: second"));
    }

    #[test]
    fn test_build_context_prefers_section_over_page() {
        let result = RetrievalResult {
            chunks: vec!["a".to_string(), "b".to_string()],
            chunk_sources: vec![info(Some("3.2"), None), info(None, Some("7"))],
            retrieval_score: 0.8,
            source: "doc".to_string(),
            notes: String::new(),
        };

        let context = build_context(&result);
        assert!(context.contains("Context 1 (Section 3.2): a"));
        assert!(context.contains("Context 2 (Page 7): b"));
    }

    #[test]
    fn test_question_prompt_embeds_query_and_context() {
        let prompt = build_question_prompt("What is the deadline?", "Context 1: text");
        assert!(prompt.contains("Question: What is the deadline?"));
        assert!(prompt.contains("Context 1: text"));
        assert!(prompt.contains("CONCISE"));
    }
}
