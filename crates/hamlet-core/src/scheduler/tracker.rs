//! Per-agent bookkeeping record.
//!
//! One `EntityTracker` exists per managed agent. It carries no reference
//! to the agent itself -- liveness is the directory's business -- only the
//! timestamps and attachment set the scheduler needs for interval gating
//! and staleness eviction.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use hamlet_types::agent::AgentId;

/// Scheduling record for one tracked agent.
#[derive(Debug, Clone)]
pub struct EntityTracker {
    agent_id: AgentId,
    created_at: Instant,
    last_access: Instant,
    /// Names of subsystems that completed their attach hook for this agent.
    attached: HashSet<String>,
}

impl EntityTracker {
    pub fn new(agent_id: AgentId) -> Self {
        let now = Instant::now();
        Self {
            agent_id,
            created_at: now,
            last_access: now,
            attached: HashSet::new(),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Record a successful access, resetting the staleness clock.
    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    /// Time since the agent was last touched.
    pub fn idle_for(&self) -> Duration {
        self.last_access.elapsed()
    }

    /// Whether this tracker has been idle past the staleness threshold.
    pub fn is_stale(&self, threshold: Duration) -> bool {
        self.idle_for() >= threshold
    }

    pub fn mark_attached(&mut self, subsystem: &str) {
        self.attached.insert(subsystem.to_string());
    }

    pub fn is_attached(&self, subsystem: &str) -> bool {
        self.attached.contains(subsystem)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }
}
