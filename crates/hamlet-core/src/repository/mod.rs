//! Repository port for interaction history.
//!
//! The conversation router persists every successful exchange through this
//! trait. Implementations live in hamlet-infra (JSONL file, in-memory).

use hamlet_types::agent::{AgentId, InteractionRecord};
use hamlet_types::error::RepositoryError;

/// Persistence port for conversational exchanges.
pub trait InteractionRepository: Send + Sync {
    /// Append one exchange. Failures are logged by the caller and never
    /// abort the reply that was already delivered.
    fn append(
        &self,
        record: &InteractionRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The most recent `limit` exchanges for an agent, oldest first.
    fn recent_for(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<InteractionRecord>, RepositoryError>> + Send;
}
