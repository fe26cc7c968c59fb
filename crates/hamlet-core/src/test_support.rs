//! Shared fakes for unit tests across the crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{json, Value};

use hamlet_types::agent::{AgentId, AgentMemory, InteractionRecord, Position};
use hamlet_types::conversation::{EnvironmentSnapshot, SpeechEvent};
use hamlet_types::error::{MessengerError, RepositoryError, SubsystemError};
use hamlet_types::generation::{GenerationError, GenerationRequest, GenerationResponse};

use crate::generation::TextGenerator;
use crate::repository::InteractionRepository;
use crate::subsystem::BehaviorSubsystem;
use crate::world::{AgentDirectory, EnvironmentProbe, Messenger, Villager};

/// Poll `cond` until it holds or the timeout expires.
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within timeout");
}

pub struct FakeSubsystem {
    name: String,
    priority: i32,
    interval: Duration,
    enabled: AtomicBool,
    pub needs_update_flag: AtomicBool,
    pub fail_attach: AtomicBool,
    pub fail_analytics: AtomicBool,
    pub attach_count: AtomicUsize,
    pub update_count: AtomicUsize,
    pub detach_count: AtomicUsize,
    pub maintenance_count: AtomicUsize,
    shutdown_log: Option<Arc<Mutex<Vec<String>>>>,
}

impl FakeSubsystem {
    pub fn new(name: &str, priority: i32) -> Self {
        Self {
            name: name.to_string(),
            priority,
            interval: Duration::ZERO,
            enabled: AtomicBool::new(true),
            needs_update_flag: AtomicBool::new(true),
            fail_attach: AtomicBool::new(false),
            fail_analytics: AtomicBool::new(false),
            attach_count: AtomicUsize::new(0),
            update_count: AtomicUsize::new(0),
            detach_count: AtomicUsize::new(0),
            maintenance_count: AtomicUsize::new(0),
            shutdown_log: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_shutdown_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.shutdown_log = Some(log);
        self
    }

    pub fn updates(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }
}

impl BehaviorSubsystem for FakeSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn update_interval(&self) -> Duration {
        self.interval
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn attach_agent(&self, _villager: &dyn Villager) -> Result<(), SubsystemError> {
        if self.fail_attach.load(Ordering::SeqCst) {
            return Err(SubsystemError::Attach("forced failure".to_string()));
        }
        self.attach_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn needs_update(&self, _villager: &dyn Villager) -> bool {
        self.needs_update_flag.load(Ordering::SeqCst)
    }

    fn update_agent(&self, _villager: &dyn Villager) -> Result<(), SubsystemError> {
        self.update_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn detach_agent(&self, _id: AgentId) -> Result<(), SubsystemError> {
        self.detach_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn perform_maintenance(&self) -> Result<(), SubsystemError> {
        self.maintenance_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) -> Result<(), SubsystemError> {
        if let Some(log) = &self.shutdown_log {
            log.lock().unwrap().push(self.name.clone());
        }
        Ok(())
    }

    fn analytics(&self) -> Result<Value, SubsystemError> {
        if self.fail_analytics.load(Ordering::SeqCst) {
            return Err(SubsystemError::Analytics("forced failure".to_string()));
        }
        Ok(json!({ "updates": self.updates() }))
    }
}

pub struct FakeVillager {
    id: AgentId,
    name: Option<String>,
    profession: Option<String>,
    position: Position,
    memory: Option<Arc<AgentMemory>>,
    pub overheard: AtomicUsize,
}

impl FakeVillager {
    pub fn new(name: &str) -> Self {
        Self {
            id: AgentId::new(),
            name: Some(name.to_string()),
            profession: None,
            position: Position::new(0.0, 0.0, 0.0),
            memory: Some(Arc::new(AgentMemory::new())),
            overheard: AtomicUsize::new(0),
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Position::new(x, y, z);
        self
    }

    pub fn nameless(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn with_profession(mut self, profession: &str) -> Self {
        self.profession = Some(profession.to_string());
        self
    }

    pub fn without_memory(mut self) -> Self {
        self.memory = None;
        self
    }
}

impl Villager for FakeVillager {
    fn id(&self) -> AgentId {
        self.id
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn profession(&self) -> Option<String> {
        self.profession.clone()
    }

    fn position(&self) -> Position {
        self.position
    }

    fn memory(&self) -> Option<Arc<AgentMemory>> {
        self.memory.clone()
    }

    fn overhear(&self, _event: &SpeechEvent) {
        self.overheard.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    villagers: DashMap<AgentId, Arc<FakeVillager>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, villager: Arc<FakeVillager>) -> AgentId {
        let id = villager.id();
        self.villagers.insert(id, villager);
        id
    }

    pub fn remove(&self, id: AgentId) {
        self.villagers.remove(&id);
    }
}

impl AgentDirectory for FakeDirectory {
    fn resolve(&self, id: AgentId) -> Option<Arc<dyn Villager>> {
        self.villagers
            .get(&id)
            .map(|v| Arc::clone(v.value()) as Arc<dyn Villager>)
    }

    fn find_nearby(&self, position: Position, radius: f64) -> Vec<Arc<dyn Villager>> {
        let mut found: Vec<Arc<FakeVillager>> = self
            .villagers
            .iter()
            .filter(|v| v.position().distance(&position) <= radius)
            .map(|v| Arc::clone(v.value()))
            .collect();
        // Stable order keeps tests deterministic.
        found.sort_by_key(|v| v.id());
        found
            .into_iter()
            .map(|v| v as Arc<dyn Villager>)
            .collect()
    }
}

pub struct FixedProbe;

impl EnvironmentProbe for FixedProbe {
    fn snapshot(&self, _position: Position, _world_tag: &str) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            location_label: "the village square".to_string(),
            ..EnvironmentSnapshot::default()
        }
    }
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Messenger for RecordingMessenger {
    fn send(&self, text: &str) -> Result<(), MessengerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MessengerError::SendFailed("forced failure".to_string()));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub struct ScriptedGenerator {
    reply: String,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub empty: AtomicBool,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            empty: AtomicBool::new(false),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::Provider {
                message: "forced failure".to_string(),
            });
        }
        let text = if self.empty.load(Ordering::SeqCst) {
            String::new()
        } else {
            self.reply.clone()
        };
        Ok(GenerationResponse { text })
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    records: Mutex<Vec<InteractionRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl InteractionRepository for MemoryRepository {
    async fn append(&self, record: &InteractionRecord) -> Result<(), RepositoryError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn recent_for(
        &self,
        agent_id: AgentId,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, RepositoryError> {
        let records = self.records.lock().unwrap();
        let mut matching: Vec<InteractionRecord> = records
            .iter()
            .filter(|r| r.agent_id == agent_id)
            .cloned()
            .collect();
        let start = matching.len().saturating_sub(limit);
        Ok(matching.drain(start..).collect())
    }
}
