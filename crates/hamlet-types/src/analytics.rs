//! Analytics payloads reported by the subsystem manager.

use serde::Serialize;
use serde_json::Value;

/// Aggregate view of the scheduler, suitable for a debug endpoint or log dump.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerAnalytics {
    pub tracked_agents: usize,
    pub total_updates: u64,
    /// Mean latency of completed update tasks, in milliseconds.
    pub average_update_latency_ms: f64,
    pub subsystems: Vec<SubsystemReport>,
}

/// Per-subsystem slice of the analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct SubsystemReport {
    pub name: String,
    pub enabled: bool,
    pub priority: i32,
    pub update_interval_ms: u64,
    pub update_count: u64,
    /// The subsystem's own analytics payload. A failing analytics hook is
    /// captured here as `{"error": "..."}` rather than propagated.
    pub details: Value,
}
