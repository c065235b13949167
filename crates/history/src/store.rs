//! Per-user history storage.
//!
//! Each user owns one JSON document at `{dir}/{user_id}_history.json`
//! holding their consent flag and ordered interaction list. Every mutation
//! rewrites the whole file; writers for the same user are serialized by an
//! in-process lock. Cross-process writers are not protected.

use chrono::{DateTime, Utc};
use copra_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One recorded chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub query: String,

    /// The full response payload as returned to the user
    pub response: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// The on-disk document for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserHistory {
    pub user_id: String,
    pub consent: bool,
    #[serde(default)]
    pub history: Vec<Interaction>,
}

/// File-backed history store.
pub struct HistoryStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HistoryStore {
    /// Create a store rooted at `dir`. The directory is created on first
    /// write, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn history_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}_history.json", user_id))
    }

    /// User ids become file names; refuse anything that could escape the
    /// store directory.
    fn validate_user_id(user_id: &str) -> AppResult<()> {
        if user_id.is_empty()
            || user_id.contains('/')
            || user_id.contains('\\')
            || user_id.contains("..")
        {
            return Err(AppError::Other(format!("Invalid user id: {:?}", user_id)));
        }
        Ok(())
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(
            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    fn read_user(&self, user_id: &str) -> AppResult<UserHistory> {
        let path = self.history_path(user_id);
        if !path.exists() {
            return Err(AppError::HistoryNotFound(user_id.to_string()));
        }

        let contents = std::fs::read_to_string(&path)?;
        let data: UserHistory = serde_json::from_str(&contents)?;
        Ok(data)
    }

    fn write_user(&self, data: &UserHistory) -> AppResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.history_path(&data.user_id);
        let json = serde_json::to_string(data)?;
        std::fs::write(&path, json)?;
        Ok(())
    }

    /// Record a user's consent decision, creating the history file on first
    /// contact.
    pub fn record_consent(&self, user_id: &str, consent: bool) -> AppResult<()> {
        Self::validate_user_id(user_id)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        tracing::info!("Recording consent for user {}: {}", user_id, consent);

        let mut data = match self.read_user(user_id) {
            Ok(data) => data,
            Err(AppError::HistoryNotFound(_)) => UserHistory {
                user_id: user_id.to_string(),
                consent,
                history: Vec::new(),
            },
            Err(e) => return Err(e),
        };

        data.consent = consent;
        self.write_user(&data)
    }

    /// Append a chat interaction, creating the history file if missing.
    pub fn append_interaction(
        &self,
        user_id: &str,
        query: &str,
        response: serde_json::Value,
    ) -> AppResult<()> {
        Self::validate_user_id(user_id)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut data = match self.read_user(user_id) {
            Ok(data) => data,
            Err(AppError::HistoryNotFound(_)) => UserHistory {
                user_id: user_id.to_string(),
                consent: true,
                history: Vec::new(),
            },
            Err(e) => return Err(e),
        };

        data.history.push(Interaction {
            timestamp: Utc::now(),
            query: query.to_string(),
            response,
            rating: None,
            feedback: None,
        });

        self.write_user(&data)?;
        tracing::info!("Saved interaction for user {}", user_id);
        Ok(())
    }

    /// Read a user's full interaction list.
    pub fn get_history(&self, user_id: &str) -> AppResult<Vec<Interaction>> {
        Self::validate_user_id(user_id)?;
        Ok(self.read_user(user_id)?.history)
    }

    /// Delete a single interaction by index.
    pub fn delete_item(&self, user_id: &str, index: usize) -> AppResult<()> {
        Self::validate_user_id(user_id)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut data = self.read_user(user_id)?;
        if index >= data.history.len() {
            return Err(AppError::InvalidHistoryIndex {
                user_id: user_id.to_string(),
                index,
            });
        }

        data.history.remove(index);
        self.write_user(&data)?;

        tracing::info!("Deleted history item {} for user {}", index, user_id);
        Ok(())
    }

    /// Delete every interaction, keeping the file and consent flag.
    pub fn delete_all(&self, user_id: &str) -> AppResult<()> {
        Self::validate_user_id(user_id)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut data = self.read_user(user_id)?;
        data.history.clear();
        self.write_user(&data)?;

        tracing::info!("Deleted all history for user {}", user_id);
        Ok(())
    }

    /// Attach a rating to the interaction at `index`.
    pub fn set_rating(&self, user_id: &str, index: usize, rating: i32) -> AppResult<()> {
        self.update_item(user_id, index, |item| item.rating = Some(rating))?;
        tracing::info!(
            "Updated rating for message {} to {} for user {}",
            index,
            rating,
            user_id
        );
        Ok(())
    }

    /// Attach feedback text to the interaction at `index`.
    pub fn set_feedback(&self, user_id: &str, index: usize, feedback: &str) -> AppResult<()> {
        let feedback = feedback.to_string();
        self.update_item(user_id, index, move |item| item.feedback = Some(feedback))?;
        tracing::info!("Updated feedback for message {} for user {}", index, user_id);
        Ok(())
    }

    fn update_item(
        &self,
        user_id: &str,
        index: usize,
        mutate: impl FnOnce(&mut Interaction),
    ) -> AppResult<()> {
        Self::validate_user_id(user_id)?;
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().unwrap();

        let mut data = self.read_user(user_id)?;
        let item = data
            .history
            .get_mut(index)
            .ok_or_else(|| AppError::InvalidHistoryIndex {
                user_id: user_id.to_string(),
                index,
            })?;

        mutate(item);
        self.write_user(&data)
    }

    /// The directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
