//! LLM integration crate for the Copra service.
//!
//! This crate provides a provider-agnostic abstraction for chat-completion
//! requests against Large Language Models. It supports OpenAI-compatible
//! endpoints through a unified trait-based interface.
//!
//! # Example
//! ```no_run
//! use copra_llm::{ChatClient, ChatRequest, ChatMessage, providers::OpenAiChatClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiChatClient::new("sk-...", "https://api.openai.com/v1");
//! let request = ChatRequest::new("gpt-4o-mini")
//!     .with_system("You are a helpful assistant.")
//!     .with_user("Hello, world!");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{ChatClient, ChatMessage, ChatRequest, ChatResponse, ChatUsage, Role};
pub use factory::create_chat_client;
pub use providers::OpenAiChatClient;
