//! Serve command handler.
//!
//! Wires up the retrieval pipeline, chatbot, and history store, then runs
//! the HTTP server until shutdown.

use crate::http::{run_server, AppState};
use clap::Args;
use copra_core::{AppConfig, AppError, AppResult};
use copra_history::{HistoryStore, InteractionLog};
use copra_llm::create_chat_client;
use copra_rag::{Chatbot, FilterPolicy, QueryExpander, Retriever, RetrieverConfig};
use std::sync::Arc;

/// Run the HTTP question answering service
#[derive(Args, Debug)]
pub struct ServeCommand {}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let chat_client = create_chat_client(
            "openai",
            Some(&config.openai_base_url),
            config.openai_api_key.as_deref(),
        )
        .map_err(AppError::Config)?;

        let embedder = super::build_embedder(config)?;
        let index = Arc::new(super::build_index(config)?);

        let expander = QueryExpander::new(Arc::clone(&chat_client), &config.chat_model);

        let retriever = Retriever::new(
            embedder,
            index,
            Some(expander),
            RetrieverConfig {
                top_k: config.top_k,
                filter: FilterPolicy::new(config.min_score, config.relaxed_min_score),
                enable_query_expansion: config.enable_query_expansion,
            },
        );

        let chatbot = Chatbot::new(retriever, chat_client, &config.chat_model);

        let state = AppState {
            chatbot: Arc::new(chatbot),
            history: Arc::new(HistoryStore::new(&config.history_dir)),
            interactions: Arc::new(InteractionLog::new(&config.log_dir)),
        };

        tracing::info!(
            "Serving with TOP_K={}, MIN_SCORE={}, query expansion {}",
            config.top_k,
            config.min_score,
            if config.enable_query_expansion {
                "enabled"
            } else {
                "disabled"
            }
        );

        run_server(&config.bind_addr, state).await
    }
}
