//! Subsystem manager: the scheduler that drives behavior subsystems
//! against the tracked agent population.
//!
//! The driving loop calls [`SubsystemManager::update`] once per time step
//! per agent. Heavier work never runs on the caller: due updates are
//! submitted fire-and-forget to a semaphore-bounded worker pool, so one
//! slow subsystem cannot stall the simulation step. Memory is bounded by
//! a tracked-agent cap plus staleness eviction; liveness comes from the
//! [`AgentDirectory`], never from owning references to agents.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hamlet_types::agent::AgentId;
use hamlet_types::analytics::{ManagerAnalytics, SubsystemReport};
use hamlet_types::config::OrchestratorConfig;

use crate::subsystem::{BehaviorSubsystem, SubsystemRegistry};
use crate::world::{AgentDirectory, Villager};

/// How long `shutdown` waits for in-flight update tasks before forcing
/// termination.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(5);

/// Counters shared with worker tasks.
#[derive(Default)]
struct UpdateCounters {
    total: AtomicU64,
    latency_micros: AtomicU64,
    per_subsystem: DashMap<String, u64>,
}

/// Scheduler and resource tracker for behavior subsystems.
pub struct SubsystemManager {
    config: OrchestratorConfig,
    directory: Arc<dyn AgentDirectory>,
    registry: SubsystemRegistry,
    trackers: DashMap<AgentId, super::EntityTracker>,
    update_clock: Arc<DashMap<(AgentId, String), Instant>>,
    update_permits: Arc<Semaphore>,
    worker_count: usize,
    counters: Arc<UpdateCounters>,
    maintenance_cancel: CancellationToken,
    maintenance_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SubsystemManager {
    pub fn new(config: OrchestratorConfig, directory: Arc<dyn AgentDirectory>) -> Self {
        let worker_count = config.update_worker_count();
        Self {
            config,
            directory,
            registry: SubsystemRegistry::new(),
            trackers: DashMap::new(),
            update_clock: Arc::new(DashMap::new()),
            update_permits: Arc::new(Semaphore::new(worker_count)),
            worker_count,
            counters: Arc::new(UpdateCounters::default()),
            maintenance_cancel: CancellationToken::new(),
            maintenance_handle: Mutex::new(None),
        }
    }

    /// Register a behavior subsystem. Duplicates are a logged no-op.
    pub fn register(&self, subsystem: Arc<dyn BehaviorSubsystem>) -> bool {
        self.registry.register(subsystem)
    }

    pub fn registry(&self) -> &SubsystemRegistry {
        &self.registry
    }

    pub fn tracked_count(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_tracked(&self, id: AgentId) -> bool {
        self.trackers.contains_key(&id)
    }

    /// Bring an agent under management and run each enabled subsystem's
    /// attach hook in priority order.
    ///
    /// Agents without a data attachment are skipped with a warning. At the
    /// tracked-agent cap, an eviction sweep runs before insertion, so the
    /// cap is never exceeded by more than the one agent being added. A
    /// failing attach hook is logged and does not stop the remaining
    /// subsystems.
    pub fn attach(&self, villager: &Arc<dyn Villager>) {
        let id = villager.id();
        if villager.memory().is_none() {
            warn!(agent = %id, "agent has no data attachment, skipping initialization");
            return;
        }
        if self.trackers.len() >= self.config.max_tracked_agents && !self.trackers.contains_key(&id)
        {
            let evicted = self.evict_stale();
            debug!(evicted, "tracked-agent cap reached, ran eviction sweep");
        }

        self.trackers
            .entry(id)
            .or_insert_with(|| super::EntityTracker::new(id));

        for subsystem in self.registry.snapshot() {
            if !subsystem.is_enabled() {
                continue;
            }
            let already = self
                .trackers
                .get(&id)
                .map(|t| t.is_attached(subsystem.name()))
                .unwrap_or(false);
            if already {
                continue;
            }
            match subsystem.attach_agent(villager.as_ref()) {
                Ok(()) => {
                    if let Some(mut tracker) = self.trackers.get_mut(&id) {
                        tracker.mark_attached(subsystem.name());
                    }
                }
                Err(e) => {
                    warn!(agent = %id, subsystem = subsystem.name(), error = %e, "attach hook failed");
                }
            }
        }

        if let Some(mut tracker) = self.trackers.get_mut(&id) {
            tracker.touch();
        }
    }

    /// Per-time-step entry point. Submits one worker task for every
    /// enabled subsystem that reports `needs_update` and whose interval
    /// has elapsed for this agent. Returns without waiting for any task.
    pub fn update(&self, villager: &Arc<dyn Villager>) {
        let id = villager.id();
        match self.trackers.get_mut(&id) {
            Some(mut tracker) => tracker.touch(),
            None => {
                self.attach(villager);
                if !self.trackers.contains_key(&id) {
                    return;
                }
            }
        }

        for subsystem in self.registry.snapshot() {
            if !subsystem.is_enabled() || !subsystem.needs_update(villager.as_ref()) {
                continue;
            }
            let key = (id, subsystem.name().to_string());
            let due = match self.update_clock.get(&key) {
                Some(last) => last.elapsed() >= subsystem.update_interval(),
                None => true,
            };
            if due {
                self.submit_update(Arc::clone(villager), subsystem);
            }
        }
    }

    fn submit_update(&self, villager: Arc<dyn Villager>, subsystem: Arc<dyn BehaviorSubsystem>) {
        let permits = Arc::clone(&self.update_permits);
        let clock = Arc::clone(&self.update_clock);
        let counters = Arc::clone(&self.counters);
        tokio::spawn(async move {
            // Queue behind the bounded pool; a closed pool means shutdown.
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let started = Instant::now();
            let id = villager.id();
            let name = subsystem.name().to_string();
            match subsystem.update_agent(villager.as_ref()) {
                Ok(()) => {
                    clock.insert((id, name.clone()), Instant::now());
                    counters.total.fetch_add(1, Ordering::Relaxed);
                    counters
                        .latency_micros
                        .fetch_add(started.elapsed().as_micros() as u64, Ordering::Relaxed);
                    counters
                        .per_subsystem
                        .entry(name)
                        .and_modify(|c| *c += 1)
                        .or_insert(1);
                }
                Err(e) => {
                    warn!(agent = %id, subsystem = %name, error = %e, "update hook failed");
                }
            }
        });
    }

    /// Drop all scheduler state for an agent and run each subsystem's
    /// detach hook, swallowing individual failures.
    pub fn cleanup(&self, agent_id: AgentId) {
        self.trackers.remove(&agent_id);
        for subsystem in self.registry.snapshot() {
            if let Err(e) = subsystem.detach_agent(agent_id) {
                warn!(agent = %agent_id, subsystem = subsystem.name(), error = %e, "detach hook failed");
            }
        }
        self.update_clock.retain(|(id, _), _| *id != agent_id);
    }

    /// Remove every tracker whose agent the directory no longer resolves
    /// or whose last access is past the staleness threshold. Idempotent.
    /// Returns the number of evicted trackers.
    pub fn evict_stale(&self) -> usize {
        let threshold = self.config.staleness_threshold();
        let stale: Vec<AgentId> = self
            .trackers
            .iter()
            .filter(|entry| {
                self.directory.resolve(*entry.key()).is_none()
                    || entry.value().is_stale(threshold)
            })
            .map(|entry| *entry.key())
            .collect();
        for id in &stale {
            self.trackers.remove(id);
            self.update_clock.retain(|(aid, _), _| aid != id);
        }
        if !stale.is_empty() {
            debug!(count = stale.len(), "evicted stale agent trackers");
        }
        stale.len()
    }

    /// One maintenance pass: staleness sweep, then every enabled
    /// subsystem's maintenance hook, each failure logged independently.
    pub fn perform_maintenance(&self) {
        self.evict_stale();
        for subsystem in self.registry.snapshot() {
            if !subsystem.is_enabled() {
                continue;
            }
            if let Err(e) = subsystem.perform_maintenance() {
                warn!(subsystem = subsystem.name(), error = %e, "maintenance hook failed");
            }
        }
    }

    /// Spawn the periodic maintenance loop. A second call is a no-op while
    /// the loop is running.
    pub fn start_maintenance(self: &Arc<Self>) {
        let mut guard = self
            .maintenance_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if guard.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        let cancel = self.maintenance_cancel.clone();
        let period = self.config.maintenance_interval();
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => manager.perform_maintenance(),
                }
            }
        }));
    }

    /// Aggregate scheduler analytics plus each subsystem's own payload.
    /// A failing analytics hook is captured as an error string.
    pub fn analytics(&self) -> ManagerAnalytics {
        let total = self.counters.total.load(Ordering::Relaxed);
        let latency_micros = self.counters.latency_micros.load(Ordering::Relaxed);
        let average_update_latency_ms = if total == 0 {
            0.0
        } else {
            latency_micros as f64 / total as f64 / 1_000.0
        };

        let subsystems = self
            .registry
            .snapshot()
            .iter()
            .map(|subsystem| {
                let details = match subsystem.analytics() {
                    Ok(value) => value,
                    Err(e) => json!({ "error": e.to_string() }),
                };
                SubsystemReport {
                    name: subsystem.name().to_string(),
                    enabled: subsystem.is_enabled(),
                    priority: subsystem.priority(),
                    update_interval_ms: subsystem.update_interval().as_millis() as u64,
                    update_count: self
                        .counters
                        .per_subsystem
                        .get(subsystem.name())
                        .map(|c| *c)
                        .unwrap_or(0),
                    details,
                }
            })
            .collect();

        ManagerAnalytics {
            tracked_agents: self.trackers.len(),
            total_updates: total,
            average_update_latency_ms,
            subsystems,
        }
    }

    /// Stop the scheduler: shutdown hooks in reverse priority order, stop
    /// the maintenance loop, drain the worker pool (bounded wait), then
    /// clear all trackers and clocks.
    pub async fn shutdown(&self) {
        for subsystem in self.registry.reverse_snapshot() {
            if let Err(e) = subsystem.shutdown() {
                warn!(subsystem = subsystem.name(), error = %e, "shutdown hook failed");
            }
        }

        self.maintenance_cancel.cancel();
        let handle = self
            .maintenance_handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
        }

        // Holding every permit means no update task is mid-hook.
        let drain = Arc::clone(&self.update_permits).acquire_many_owned(self.worker_count as u32);
        if tokio::time::timeout(SHUTDOWN_DRAIN, drain).await.is_err() {
            warn!("update workers still busy at shutdown, forcing termination");
        }
        self.update_permits.close();

        self.trackers.clear();
        self.update_clock.clear();
    }
}

impl std::fmt::Debug for SubsystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsystemManager")
            .field("tracked_agents", &self.trackers.len())
            .field("subsystems", &self.registry.len())
            .field("worker_count", &self.worker_count)
            .finish()
    }
}
