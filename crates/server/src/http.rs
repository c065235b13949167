//! HTTP surface for the question answering service.
//!
//! Exposes the chat endpoint plus the consent/history/feedback CRUD routes.
//! Typed data-integrity errors map to 404/400 responses; the process never
//! crashes on them.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use copra_core::{AppError, AppResult};
use copra_history::{HistoryStore, InteractionLog, InteractionRecord};
use copra_rag::{ChatOutcome, Chatbot};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub chatbot: Arc<Chatbot>,
    pub history: Arc<HistoryStore>,
    pub interactions: Arc<InteractionLog>,
}

/// Error wrapper mapping `AppError` onto HTTP responses.
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::HistoryNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidHistoryIndex { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
        }

        let body = json!({
            "status": "error",
            "message": self.0.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Build the service router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/consent", post(consent))
        .route("/history", get(history))
        .route("/delete_history_item", delete(delete_history_item))
        .route("/delete_all_history", delete(delete_all_history))
        .route("/update_rating", post(update_rating))
        .route("/update_feedback", post(update_feedback))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run_server(bind_addr: &str, state: AppState) -> AppResult<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn default_user_id() -> String {
    "default_user".to_string()
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    #[serde(default)]
    query: String,

    #[serde(default = "default_user_id", alias = "student_id")]
    user_id: String,

    /// Client-side conversation state, accepted for interface compatibility
    #[serde(default)]
    #[allow(dead_code)]
    history: Vec<serde_json::Value>,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatOutcome>, ApiError> {
    tracing::info!("User {} query: {}", payload.user_id, payload.query);

    let outcome = state.chatbot.respond(&payload.query).await?;

    let record = InteractionRecord {
        timestamp: Utc::now(),
        user_id: payload.user_id.clone(),
        query: payload.query.clone(),
        chunks: outcome.chunks.clone(),
        chunk_sources: serde_json::to_value(&outcome.chunk_sources).unwrap_or_default(),
        retrieval_score: outcome.retrieval_score,
        answer: outcome.answer.clone(),
    };
    if let Err(e) = state.interactions.append(&record) {
        tracing::warn!("Failed to write interaction log: {}", e);
    }

    // A history-write failure must not cost the user their answer.
    match serde_json::to_value(&outcome) {
        Ok(response) => {
            if let Err(e) =
                state
                    .history
                    .append_interaction(&payload.user_id, &payload.query, response)
            {
                tracing::error!(
                    "Error saving interaction for user {}: {}",
                    payload.user_id,
                    e
                );
            }
        }
        Err(e) => tracing::error!("Failed to serialize interaction: {}", e),
    }

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct ConsentPayload {
    #[serde(default = "default_user_id", alias = "student_id")]
    user_id: String,

    #[serde(default)]
    consent: bool,
}

async fn consent(
    State(state): State<AppState>,
    Json(payload): Json<ConsentPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.history.record_consent(&payload.user_id, payload.consent)?;
    Ok(Json(json!({"status": "success", "user_id": payload.user_id})))
}

#[derive(Debug, Deserialize)]
struct UserParams {
    user_id: String,
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let history = state.history.get_history(&params.user_id)?;
    Ok(Json(json!({"status": "success", "history": history})))
}

#[derive(Debug, Deserialize)]
struct ItemParams {
    user_id: String,
    index: usize,
}

async fn delete_history_item(
    State(state): State<AppState>,
    Query(params): Query<ItemParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.history.delete_item(&params.user_id, params.index)?;
    Ok(Json(json!({"status": "success"})))
}

async fn delete_all_history(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.history.delete_all(&params.user_id)?;
    Ok(Json(json!({"status": "success"})))
}

#[derive(Debug, Deserialize)]
struct RatingParams {
    user_id: String,
    message_id: usize,
    rating: i32,
}

async fn update_rating(
    State(state): State<AppState>,
    Query(params): Query<RatingParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .history
        .set_rating(&params.user_id, params.message_id, params.rating)?;
    Ok(Json(json!({"status": "success"})))
}

#[derive(Debug, Deserialize)]
struct FeedbackParams {
    user_id: String,
    message_id: usize,
    feedback: String,
}

async fn update_feedback(
    State(state): State<AppState>,
    Query(params): Query<FeedbackParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .history
        .set_feedback(&params.user_id, params.message_id, &params.feedback)?;
    Ok(Json(json!({"status": "success"})))
}
