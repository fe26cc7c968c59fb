//! In-memory interaction repository for tests and ephemeral worlds.

use std::sync::Mutex;

use hamlet_core::repository::InteractionRepository;
use hamlet_types::agent::{AgentId, InteractionRecord};
use hamlet_types::error::RepositoryError;

/// Keeps every exchange in memory. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryInteractionRepository {
    records: Mutex<Vec<InteractionRecord>>,
}

impl InMemoryInteractionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<InteractionRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl InteractionRepository for InMemoryInteractionRepository {
    async fn append(&self, record: &InteractionRecord) -> Result<(), RepositoryError> {
        self.lock().push(record.clone());
        Ok(())
    }

    async fn recent_for(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, RepositoryError> {
        let records = self.lock();
        let mut matching: Vec<InteractionRecord> = records
            .iter()
            .filter(|r| r.agent_id == agent_id)
            .cloned()
            .collect();
        let start = matching.len().saturating_sub(limit);
        Ok(matching.drain(start..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(agent_id: AgentId, reply: &str) -> InteractionRecord {
        InteractionRecord {
            agent_id,
            speaker: "Alex".to_string(),
            utterance: "hello there".to_string(),
            reply: reply.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let repo = InMemoryInteractionRepository::new();
        let id = AgentId::new();
        repo.append(&record(id, "one")).await.unwrap();
        repo.append(&record(id, "two")).await.unwrap();

        let recent = repo.recent_for(id, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].reply, "one");
        assert_eq!(recent[1].reply, "two");
    }

    #[tokio::test]
    async fn limit_keeps_the_most_recent() {
        let repo = InMemoryInteractionRepository::new();
        let id = AgentId::new();
        for i in 0..5 {
            repo.append(&record(id, &format!("reply {i}"))).await.unwrap();
        }

        let recent = repo.recent_for(id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].reply, "reply 3");
        assert_eq!(recent[1].reply, "reply 4");
    }

    #[tokio::test]
    async fn other_agents_are_filtered_out() {
        let repo = InMemoryInteractionRepository::new();
        let brigid = AgentId::new();
        let cormac = AgentId::new();
        repo.append(&record(brigid, "mine")).await.unwrap();
        repo.append(&record(cormac, "not mine")).await.unwrap();

        let recent = repo.recent_for(brigid, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].reply, "mine");
    }
}
