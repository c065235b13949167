//! Query expansion for improved recall.
//!
//! Asks a generative model for alternative phrasings of the user's query and
//! parses them out of the free-form completion. Expansion is strictly
//! best-effort: any failure degrades to the original query alone.

use copra_core::AppResult;
use copra_llm::{ChatClient, ChatRequest};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

lazy_static! {
    static ref DOUBLE_QUOTED: Regex = Regex::new(r#""([^"]*)""#).unwrap();
    static ref SINGLE_QUOTED: Regex = Regex::new(r"'([^']*)'").unwrap();
}

const EXPANSION_SYSTEM_PROMPT: &str = "You are a helpful assistant that reformulates \
research queries to improve retrieval. Generate 2-3 alternative phrasings that preserve \
the original meaning but use different terminology. Format the output as a list of \
double-quoted strings.";

/// Generates query variations via a chat-completion call.
pub struct QueryExpander {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl QueryExpander {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Produce the query variation set for `query`.
    ///
    /// The result always starts with the original query, contains no exact
    /// duplicates, and never fails: errors from the generative call are
    /// logged and collapse the set to the original alone.
    pub async fn expand(&self, query: &str) -> Vec<String> {
        let variations = match self.generate_variations(query).await {
            Ok(variations) => variations,
            Err(e) => {
                tracing::error!("Error generating query variations: {}", e);
                Vec::new()
            }
        };

        let mut all_queries = vec![query.to_string()];
        for variation in variations {
            let variation = variation.trim().to_string();
            if !variation.is_empty() && !all_queries.contains(&variation) {
                all_queries.push(variation);
            }
        }

        all_queries
    }

    async fn generate_variations(&self, query: &str) -> AppResult<Vec<String>> {
        let request = ChatRequest::new(&self.model)
            .with_system(EXPANSION_SYSTEM_PROMPT)
            .with_user(format!(
                "Original query: {}\nGenerate alternative phrasings:",
                query
            ))
            .with_max_tokens(200)
            .with_temperature(0.7);

        let response = self.client.complete(&request).await?;
        Ok(parse_variations(&response.content))
    }
}

/// Extract variation strings from a free-form completion.
///
/// Strategies, in order: double-quoted substrings, single-quoted substrings,
/// and finally plain line splitting that ignores bracket-delimiter lines.
/// Total parse failure is just an empty result, never an error.
fn parse_variations(content: &str) -> Vec<String> {
    let quoted: Vec<String> = DOUBLE_QUOTED
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }

    let quoted: Vec<String> = SINGLE_QUOTED
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('[') && !line.ends_with(']'))
        .map(|line| line.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use copra_core::AppError;
    use copra_llm::{ChatResponse, ChatUsage};

    /// Chat client returning a canned completion, or an error.
    struct CannedClient {
        reply: Result<String, String>,
    }

    #[async_trait::async_trait]
    impl ChatClient for CannedClient {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _request: &ChatRequest) -> AppResult<ChatResponse> {
            match &self.reply {
                Ok(content) => Ok(ChatResponse {
                    content: content.clone(),
                    model: "canned".to_string(),
                    usage: ChatUsage::default(),
                }),
                Err(msg) => Err(AppError::Llm(msg.clone())),
            }
        }
    }

    fn expander(reply: Result<&str, &str>) -> QueryExpander {
        QueryExpander::new(
            Arc::new(CannedClient {
                reply: reply.map(str::to_string).map_err(str::to_string),
            }),
            "test-model",
        )
    }

    #[test]
    fn test_parse_double_quoted_list() {
        let content = r#"["What are the submission rules?", "How do I submit a thesis?"]"#;
        let variations = parse_variations(content);
        assert_eq!(variations.len(), 2);
        assert_eq!(variations[0], "What are the submission rules?");
    }

    #[test]
    fn test_parse_single_quoted_list() {
        let content = "['first phrasing', 'second phrasing']";
        let variations = parse_variations(content);
        assert_eq!(variations, vec!["first phrasing", "second phrasing"]);
    }

    #[test]
    fn test_parse_line_fallback_skips_brackets() {
        let content = "[\nfirst phrasing\nsecond phrasing\n]";
        let variations = parse_variations(content);
        assert_eq!(variations, vec!["first phrasing", "second phrasing"]);
    }

    #[test]
    fn test_parse_garbage_yields_empty() {
        assert!(parse_variations("").is_empty());
        assert!(parse_variations("[]").is_empty());
    }

    #[tokio::test]
    async fn test_expand_prepends_original_and_dedups() {
        let expander = expander(Ok(r#""same query" and "a different phrasing""#));
        let variations = expander.expand("same query").await;

        assert_eq!(variations[0], "same query");
        assert_eq!(variations.len(), 2);
        assert!(variations.contains(&"a different phrasing".to_string()));
    }

    #[tokio::test]
    async fn test_expand_falls_back_to_original_on_error() {
        let expander = expander(Err("quota exceeded"));
        let variations = expander.expand("the original query").await;

        assert_eq!(variations, vec!["the original query".to_string()]);
    }

    #[tokio::test]
    async fn test_expand_falls_back_on_unparseable_output() {
        let expander = expander(Ok("[]"));
        let variations = expander.expand("the original query").await;

        assert_eq!(variations, vec!["the original query".to_string()]);
    }

    #[tokio::test]
    async fn test_expand_accepts_empty_query() {
        let expander = expander(Err("down"));
        let variations = expander.expand("").await;

        assert_eq!(variations, vec![String::new()]);
    }
}
