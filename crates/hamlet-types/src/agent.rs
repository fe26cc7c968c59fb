//! Agent identity, position, and the per-agent persistent data attachment.
//!
//! `AgentId` is the key for every concurrent map in the orchestration core.
//! `AgentMemory` is the attachment the simulation engine hangs off each
//! agent; the core reads and appends interaction history through it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of interactions retained in an agent's rolling history.
const MAX_HISTORY: usize = 64;

/// Stable identity of a simulated agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Mint a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Squared Euclidean distance. Preferred for comparisons.
    pub fn distance_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Position) -> f64 {
        self.distance_sq(other).sqrt()
    }
}

/// One persisted conversational exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub agent_id: AgentId,
    /// Display name of the actor who spoke to the agent.
    pub speaker: String,
    pub utterance: String,
    pub reply: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-agent persistent data attachment.
///
/// Holds the rolling interaction history and the relationship labels the
/// agent has formed toward named actors. The simulation engine owns the
/// attachment; the orchestration core only reads and appends through it.
/// All access goes through a `Mutex` so worker tasks can share it freely.
#[derive(Debug, Default)]
pub struct AgentMemory {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    interactions: Vec<InteractionRecord>,
    relationships: HashMap<String, String>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an exchange, dropping the oldest entries past the history cap.
    pub fn record_interaction(&self, record: InteractionRecord) {
        let mut inner = self.lock();
        inner.interactions.push(record);
        if inner.interactions.len() > MAX_HISTORY {
            let excess = inner.interactions.len() - MAX_HISTORY;
            inner.interactions.drain(..excess);
        }
    }

    /// The most recent `n` exchanges, oldest first.
    pub fn recent_interactions(&self, n: usize) -> Vec<InteractionRecord> {
        let inner = self.lock();
        let start = inner.interactions.len().saturating_sub(n);
        inner.interactions[start..].to_vec()
    }

    pub fn interaction_count(&self) -> usize {
        self.lock().interactions.len()
    }

    /// Relationship label toward a named actor ("friend", "stranger", ...).
    pub fn relationship_with(&self, speaker: &str) -> Option<String> {
        self.lock().relationships.get(speaker).cloned()
    }

    pub fn set_relationship(&self, speaker: impl Into<String>, label: impl Into<String>) {
        self.lock().relationships.insert(speaker.into(), label.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned lock only means a panicking writer; the data is still
        // the last consistent snapshot.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reply: &str) -> InteractionRecord {
        InteractionRecord {
            agent_id: AgentId::new(),
            speaker: "Alex".to_string(),
            utterance: "hello there".to_string(),
            reply: reply.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_agent_id_display_roundtrip() {
        let id = AgentId::new();
        let parsed = AgentId::from_uuid(id.to_string().parse().unwrap());
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert!((a.distance(&b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_sq(&b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_memory_records_and_returns_recent() {
        let memory = AgentMemory::new();
        memory.record_interaction(record("first"));
        memory.record_interaction(record("second"));

        let recent = memory.recent_interactions(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].reply, "second");
    }

    #[test]
    fn test_memory_history_is_bounded() {
        let memory = AgentMemory::new();
        for i in 0..(MAX_HISTORY + 10) {
            memory.record_interaction(record(&format!("reply {i}")));
        }
        assert_eq!(memory.interaction_count(), MAX_HISTORY);
        let recent = memory.recent_interactions(1);
        assert_eq!(recent[0].reply, format!("reply {}", MAX_HISTORY + 9));
    }

    #[test]
    fn test_relationship_labels() {
        let memory = AgentMemory::new();
        assert!(memory.relationship_with("Alex").is_none());
        memory.set_relationship("Alex", "friend");
        assert_eq!(memory.relationship_with("Alex").as_deref(), Some("friend"));
    }

    #[test]
    fn test_interaction_record_serde_roundtrip() {
        let rec = record("well met");
        let json = serde_json::to_string(&rec).unwrap();
        let parsed: InteractionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.reply, "well met");
        assert_eq!(parsed.agent_id, rec.agent_id);
    }
}
