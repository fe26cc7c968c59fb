//! Append-only JSONL storage for interaction history.
//!
//! One JSON object per line. Malformed lines (a crash mid-write, manual
//! edits) are skipped with a warning on read instead of poisoning the
//! whole file.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tracing::warn;

use hamlet_core::repository::InteractionRepository;
use hamlet_types::agent::{AgentId, InteractionRecord};
use hamlet_types::error::RepositoryError;

/// File-backed interaction repository.
pub struct JsonlInteractionRepository {
    path: PathBuf,
}

impl JsonlInteractionRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl InteractionRepository for JsonlInteractionRepository {
    async fn append(&self, record: &InteractionRecord) -> Result<(), RepositoryError> {
        let line = serde_json::to_string(record)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;

        file.write_all(format!("{line}\n").as_bytes())
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        Ok(())
    }

    async fn recent_for(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, RepositoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::Io(e.to_string())),
        };

        let mut matching: Vec<InteractionRecord> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<InteractionRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "skipping malformed history line");
                    None
                }
            })
            .filter(|record| record.agent_id == agent_id)
            .collect();

        let start = matching.len().saturating_sub(limit);
        Ok(matching.drain(start..).collect())
    }
}
