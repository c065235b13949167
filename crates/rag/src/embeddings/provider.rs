//! Embedding provider trait and factory.

use copra_core::{AppError, AppResult};
use std::sync::Arc;

/// Dimension of the default embedding model (text-embedding-3-small).
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch, one vector per
    /// input text, same order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Llm("No embedding returned".to_string()))
    }
}

/// Create an embedding provider by name.
///
/// `"openai"` requires an API key; `"mock"` is deterministic and offline,
/// intended for tests and local development.
pub fn create_provider(
    provider: &str,
    model: &str,
    base_url: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "openai" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI embedding provider requires API key".to_string())
            })?;
            let base_url = base_url.unwrap_or("https://api.openai.com/v1");
            let provider = super::providers::openai::OpenAiProvider::new(
                api_key,
                base_url,
                model,
                DEFAULT_EMBEDDING_DIM,
            );
            Ok(Arc::new(provider))
        }

        "mock" => {
            let provider = super::providers::mock::MockProvider::new(DEFAULT_EMBEDDING_DIM);
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, mock",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider("mock", "any", None, None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), DEFAULT_EMBEDDING_DIM);
    }

    #[test]
    fn test_create_openai_provider() {
        let provider =
            create_provider("openai", "text-embedding-3-small", None, Some("sk-test")).unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_name(), "text-embedding-3-small");
    }

    #[test]
    fn test_openai_requires_api_key() {
        let result = create_provider("openai", "text-embedding-3-small", None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider("unknown", "m", None, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider("mock", "any", None, None).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), DEFAULT_EMBEDDING_DIM);
    }
}
