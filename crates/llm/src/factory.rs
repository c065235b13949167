//! Chat client factory.
//!
//! This module provides a factory for creating chat clients based on
//! application configuration. It handles provider resolution and secret
//! injection.

use crate::client::ChatClient;
use crate::providers::OpenAiChatClient;
use std::sync::Arc;

/// Create a chat client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai" or any OpenAI-compatible name)
/// * `base_url` - Optional custom endpoint URL
/// * `api_key` - API key (required)
///
/// # Returns
/// A shared trait object implementing `ChatClient`
///
/// # Errors
/// Returns error if the provider is unknown or required secrets are missing.
pub fn create_chat_client(
    provider: &str,
    base_url: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn ChatClient>, String> {
    match provider.to_lowercase().as_str() {
        "openai" => {
            let api_key = api_key.ok_or_else(|| "OpenAI provider requires API key".to_string())?;
            let base_url = base_url.unwrap_or("https://api.openai.com/v1");
            Ok(Arc::new(OpenAiChatClient::new(api_key, base_url)))
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}
