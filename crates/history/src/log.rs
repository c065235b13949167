//! Interaction audit log.
//!
//! Appends one JSON line per chat turn to a daily `interactions_YYYYMMDD.jsonl`
//! file, capturing the retrieval context behind every answer.

use chrono::{DateTime, Utc};
use copra_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One audited chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub query: String,
    pub chunks: Vec<String>,
    pub chunk_sources: serde_json::Value,
    pub retrieval_score: f32,
    pub answer: String,
}

/// Append-only daily audit log.
pub struct InteractionLog {
    dir: PathBuf,
}

impl InteractionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn log_path(&self, timestamp: &DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("interactions_{}.jsonl", timestamp.format("%Y%m%d")))
    }

    /// Append a record to today's log file.
    pub fn append(&self, record: &InteractionRecord) -> AppResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.log_path(&record.timestamp);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::Other(format!("Failed to open {:?}: {}", path, e)))?;

        let json_line = serde_json::to_string(record)?;
        writeln!(file, "{}", json_line)
            .map_err(|e| AppError::Other(format!("Failed to write to {:?}: {}", path, e)))?;

        tracing::debug!("Logged interaction for user {}", record.user_id);
        Ok(())
    }

    /// The directory backing this log.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(user_id: &str, query: &str) -> InteractionRecord {
        InteractionRecord {
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
            query: query.to_string(),
            chunks: vec!["chunk text".to_string()],
            chunk_sources: json!([{"id": "Chunk 1", "source": "doc"}]),
            retrieval_score: 0.8,
            answer: "the answer".to_string(),
        }
    }

    #[test]
    fn test_append_creates_daily_file() {
        let temp = TempDir::new().unwrap();
        let log = InteractionLog::new(temp.path());

        let r = record("alice", "q1");
        log.append(&r).unwrap();

        let path = log.log_path(&r.timestamp);
        assert!(path.exists());
    }

    #[test]
    fn test_append_is_line_delimited() {
        let temp = TempDir::new().unwrap();
        let log = InteractionLog::new(temp.path());

        let r1 = record("alice", "q1");
        log.append(&r1).unwrap();
        log.append(&record("bob", "q2")).unwrap();

        let contents = std::fs::read_to_string(log.log_path(&r1.timestamp)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: InteractionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.user_id, "alice");
        assert_eq!(parsed.chunks.len(), 1);
    }
}
