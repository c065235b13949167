//! Configuration management for the Copra service.
//!
//! Configuration is environment-driven with sensible defaults, mirroring the
//! `.env`-based setup the service is deployed with. CLI flags override
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default number of candidate matches requested per vector-search call.
pub const DEFAULT_TOP_K: usize = 15;

/// Default primary similarity threshold for retrieval.
pub const DEFAULT_MIN_SCORE: f32 = 0.5;

/// Default relaxed similarity threshold used when too few matches pass
/// the primary threshold. Kept independent from `DEFAULT_MIN_SCORE`.
pub const DEFAULT_RELAXED_MIN_SCORE: f32 = 0.45;

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// service behavior across the server and ingestion commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the OpenAI-compatible model endpoint
    pub openai_api_key: Option<String>,

    /// Base URL for the OpenAI-compatible model endpoint
    pub openai_base_url: String,

    /// Chat completion model identifier
    pub chat_model: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// API key for the vector index service
    pub pinecone_api_key: Option<String>,

    /// Host URL of the vector index (data-plane endpoint)
    pub pinecone_host: Option<String>,

    /// Number of candidates requested per vector-search call
    pub top_k: usize,

    /// Primary similarity threshold
    pub min_score: f32,

    /// Relaxed similarity threshold (must stay below `min_score`)
    pub relaxed_min_score: f32,

    /// Whether to generate query variations before searching
    pub enable_query_expansion: bool,

    /// Directory holding per-user history files
    pub history_dir: PathBuf,

    /// Directory holding interaction audit logs
    pub log_dir: PathBuf,

    /// Bind address for the HTTP server
    pub bind_addr: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            pinecone_api_key: None,
            pinecone_host: None,
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            relaxed_min_score: DEFAULT_RELAXED_MIN_SCORE,
            enable_query_expansion: true,
            history_dir: PathBuf::from("data/history"),
            log_dir: PathBuf::from("logs"),
            bind_addr: "127.0.0.1:8000".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`: model endpoint
    /// - `COPRA_CHAT_MODEL`, `COPRA_EMBEDDING_MODEL`: model identifiers
    /// - `PINECONE_API_KEY`, `PINECONE_HOST`: vector index service
    /// - `TOP_K`, `MIN_SCORE`, `RELAXED_MIN_SCORE`: retrieval tuning
    /// - `ENABLE_QUERY_EXPANSION`: "true"/"false"
    /// - `COPRA_HISTORY_DIR`, `COPRA_LOG_DIR`: storage locations
    /// - `COPRA_BIND_ADDR`: HTTP bind address
    /// - `RUST_LOG`: log level
    /// - `NO_COLOR`: disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.openai_base_url = base_url;
        }

        if let Ok(model) = std::env::var("COPRA_CHAT_MODEL") {
            config.chat_model = model;
        }

        if let Ok(model) = std::env::var("COPRA_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.pinecone_api_key = std::env::var("PINECONE_API_KEY").ok();
        config.pinecone_host = std::env::var("PINECONE_HOST").ok();

        if let Ok(top_k) = std::env::var("TOP_K") {
            config.top_k = top_k
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid TOP_K value: {}", top_k)))?;
        }

        if let Ok(min_score) = std::env::var("MIN_SCORE") {
            config.min_score = min_score
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid MIN_SCORE value: {}", min_score)))?;
        }

        if let Ok(relaxed) = std::env::var("RELAXED_MIN_SCORE") {
            config.relaxed_min_score = relaxed.parse().map_err(|_| {
                AppError::Config(format!("Invalid RELAXED_MIN_SCORE value: {}", relaxed))
            })?;
        }

        if let Ok(expansion) = std::env::var("ENABLE_QUERY_EXPANSION") {
            config.enable_query_expansion = expansion.to_lowercase() == "true";
        }

        if let Ok(dir) = std::env::var("COPRA_HISTORY_DIR") {
            config.history_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("COPRA_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Ok(addr) = std::env::var("COPRA_BIND_ADDR") {
            config.bind_addr = addr;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    pub fn with_overrides(
        mut self,
        bind_addr: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate configuration before it reaches the service clients.
    pub fn validate(&self) -> AppResult<()> {
        if self.top_k == 0 {
            return Err(AppError::Config(
                "TOP_K must be a positive integer".to_string(),
            ));
        }

        if self.relaxed_min_score > self.min_score {
            return Err(AppError::Config(format!(
                "RELAXED_MIN_SCORE ({}) must not exceed MIN_SCORE ({})",
                self.relaxed_min_score, self.min_score
            )));
        }

        if self.openai_api_key.is_none() {
            return Err(AppError::Config(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }

        if self.pinecone_api_key.is_none() || self.pinecone_host.is_none() {
            return Err(AppError::Config(
                "PINECONE_API_KEY and PINECONE_HOST must be set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.top_k, 15);
        assert_eq!(config.min_score, 0.5);
        assert_eq!(config.relaxed_min_score, 0.45);
        assert!(config.enable_query_expansion);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("0.0.0.0:9000".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.bind_addr, "0.0.0.0:9000");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.openai_api_key = Some("key".to_string());
        config.pinecone_api_key = Some("key".to_string());
        config.pinecone_host = Some("https://index.example".to_string());
        config.min_score = 0.4;
        config.relaxed_min_score = 0.45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_credentials() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());
    }
}
