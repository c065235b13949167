//! Per-user conversation history and interaction audit logging.
//!
//! One JSON document per user holds consent and the ordered interaction
//! list; a daily JSONL file records every chat turn for traceability.

pub mod log;
pub mod store;

pub use log::{InteractionLog, InteractionRecord};
pub use store::{HistoryStore, Interaction, UserHistory};
