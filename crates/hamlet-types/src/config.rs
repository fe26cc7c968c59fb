//! Orchestrator configuration.
//!
//! `OrchestratorConfig` represents the `hamlet.toml` that controls every
//! tunable of the core: concurrency caps, cooldown/cache/rate-limit
//! windows, staleness and maintenance periods, and generation parameters.
//! All fields have defaults so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the orchestration core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Cap on simultaneously generating conversation replies.
    #[serde(default = "default_max_concurrent_replies")]
    pub max_concurrent_replies: usize,

    /// Minimum spacing between two generations for one agent (router gate).
    #[serde(default = "default_reply_cooldown_ms")]
    pub reply_cooldown_ms: u64,

    /// Freshness window for cached responses.
    #[serde(default = "default_response_cache_ttl_ms")]
    pub response_cache_ttl_ms: u64,

    /// Hard cap on cached responses before an eviction sweep runs.
    #[serde(default = "default_response_cache_max_entries")]
    pub response_cache_max_entries: usize,

    /// Minimum spacing between two delivered replies for one agent
    /// (delivery gate, independent from the router cooldown).
    #[serde(default = "default_delivery_window_ms")]
    pub delivery_window_ms: u64,

    /// Replies longer than this are truncated with an ellipsis.
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,

    /// Tracked agents untouched for longer than this are evicted.
    #[serde(default = "default_staleness_threshold_secs")]
    pub staleness_threshold_secs: u64,

    /// Period of the staleness/maintenance sweep.
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,

    /// Hard cap on tracked agents; reaching it triggers an eviction sweep.
    #[serde(default = "default_max_tracked_agents")]
    pub max_tracked_agents: usize,

    /// Hard timeout applied to every generation call.
    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,

    /// Token budget per generated reply.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature for generated replies.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Lower clamp for the subsystem update worker pool.
    #[serde(default = "default_update_workers_min")]
    pub update_workers_min: usize,

    /// Upper clamp for the subsystem update worker pool.
    #[serde(default = "default_update_workers_max")]
    pub update_workers_max: usize,
}

fn default_max_concurrent_replies() -> usize {
    3
}

fn default_reply_cooldown_ms() -> u64 {
    5_000
}

fn default_response_cache_ttl_ms() -> u64 {
    10_000
}

fn default_response_cache_max_entries() -> usize {
    256
}

fn default_delivery_window_ms() -> u64 {
    3_000
}

fn default_max_reply_chars() -> usize {
    256
}

fn default_staleness_threshold_secs() -> u64 {
    3_600
}

fn default_maintenance_interval_secs() -> u64 {
    300
}

fn default_max_tracked_agents() -> usize {
    10_000
}

fn default_generation_timeout_ms() -> u64 {
    3_000
}

fn default_max_output_tokens() -> u32 {
    128
}

fn default_temperature() -> f32 {
    0.8
}

fn default_update_workers_min() -> usize {
    2
}

fn default_update_workers_max() -> usize {
    8
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_replies: default_max_concurrent_replies(),
            reply_cooldown_ms: default_reply_cooldown_ms(),
            response_cache_ttl_ms: default_response_cache_ttl_ms(),
            response_cache_max_entries: default_response_cache_max_entries(),
            delivery_window_ms: default_delivery_window_ms(),
            max_reply_chars: default_max_reply_chars(),
            staleness_threshold_secs: default_staleness_threshold_secs(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
            max_tracked_agents: default_max_tracked_agents(),
            generation_timeout_ms: default_generation_timeout_ms(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            update_workers_min: default_update_workers_min(),
            update_workers_max: default_update_workers_max(),
        }
    }
}

impl OrchestratorConfig {
    pub fn reply_cooldown(&self) -> Duration {
        Duration::from_millis(self.reply_cooldown_ms)
    }

    pub fn response_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.response_cache_ttl_ms)
    }

    pub fn delivery_window(&self) -> Duration {
        Duration::from_millis(self.delivery_window_ms)
    }

    pub fn staleness_threshold(&self) -> Duration {
        Duration::from_secs(self.staleness_threshold_secs)
    }

    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    /// Update worker pool size: available parallelism clamped to the
    /// configured range.
    pub fn update_worker_count(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(self.update_workers_min);
        available.clamp(self.update_workers_min, self.update_workers_max.max(self.update_workers_min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_concurrent_replies, 3);
        assert_eq!(config.reply_cooldown_ms, 5_000);
        assert_eq!(config.response_cache_ttl_ms, 10_000);
        assert_eq!(config.delivery_window_ms, 3_000);
        assert_eq!(config.staleness_threshold_secs, 3_600);
        assert_eq!(config.maintenance_interval_secs, 300);
        assert_eq!(config.max_tracked_agents, 10_000);
        assert_eq!(config.generation_timeout_ms, 3_000);
    }

    #[test]
    fn test_config_deserialize_empty_toml_uses_defaults() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_concurrent_replies, 3);
        assert_eq!(config.max_tracked_agents, 10_000);
    }

    #[test]
    fn test_config_partial_toml_overrides_named_fields_only() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
reply_cooldown_ms = 2000
max_concurrent_replies = 5
"#,
        )
        .unwrap();
        assert_eq!(config.reply_cooldown_ms, 2_000);
        assert_eq!(config.max_concurrent_replies, 5);
        // Untouched fields keep defaults
        assert_eq!(config.response_cache_ttl_ms, 10_000);
        assert_eq!(config.delivery_window_ms, 3_000);
    }

    #[test]
    fn test_duration_accessors() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.reply_cooldown(), Duration::from_secs(5));
        assert_eq!(config.response_cache_ttl(), Duration::from_secs(10));
        assert_eq!(config.delivery_window(), Duration::from_secs(3));
        assert_eq!(config.generation_timeout(), Duration::from_millis(3_000));
    }

    #[test]
    fn test_update_worker_count_respects_clamp() {
        let config = OrchestratorConfig {
            update_workers_min: 2,
            update_workers_max: 8,
            ..Default::default()
        };
        let n = config.update_worker_count();
        assert!((2..=8).contains(&n));
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = OrchestratorConfig {
            max_concurrent_replies: 4,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: OrchestratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_concurrent_replies, 4);
        assert_eq!(parsed.reply_cooldown_ms, 5_000);
    }
}
