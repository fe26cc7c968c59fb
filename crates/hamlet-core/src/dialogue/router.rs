//! Conversation router: the asynchronous pipeline from speech event to
//! delivered reply.
//!
//! Per request: cooldown check (silent drop), bounded admission, cache
//! lookup, prompt construction, generation with a hard timeout, then the
//! success path (cache, cooldown stamp, delivery, history, persistence).
//! Every per-agent failure is isolated; nothing here propagates to the
//! driving loop.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use hamlet_types::agent::{AgentId, InteractionRecord};
use hamlet_types::config::OrchestratorConfig;
use hamlet_types::conversation::{ConversationContext, SpeechEvent, SpeechOutcome};
use hamlet_types::generation::{GenerationError, GenerationRequest};

use crate::dialogue::cache::{CacheKey, ResponseCache};
use crate::dialogue::delivery::ResponseDelivery;
use crate::dialogue::prompt::build_prompt;
use crate::dialogue::selector::{select_target, summarize_nearby};
use crate::dialogue::trigger::TriggerMatcher;
use crate::generation::TextGenerator;
use crate::repository::InteractionRepository;
use crate::world::{AgentDirectory, EnvironmentProbe, Messenger, Villager};

/// How many recent exchanges feed the prompt's history section.
const PROMPT_HISTORY_DEPTH: usize = 4;

/// Dispatches inbound speech events to generated villager replies.
///
/// Cloning is cheap; all state lives behind one `Arc` and is shared with
/// the worker tasks the router spawns.
pub struct ConversationRouter<G, R> {
    inner: Arc<RouterInner<G, R>>,
}

struct RouterInner<G, R> {
    config: OrchestratorConfig,
    directory: Arc<dyn AgentDirectory>,
    environment: Arc<dyn EnvironmentProbe>,
    generator: Arc<G>,
    repository: Arc<R>,
    trigger: TriggerMatcher,
    cache: ResponseCache,
    delivery: ResponseDelivery,
    /// Router-level cooldown: whether an agent is willing to generate.
    /// Independent from the delivery rate limit inside `delivery`.
    cooldowns: DashMap<AgentId, Instant>,
    permits: Arc<Semaphore>,
}

impl<G, R> ConversationRouter<G, R>
where
    G: TextGenerator + 'static,
    R: InteractionRepository + 'static,
{
    pub fn new(
        config: OrchestratorConfig,
        directory: Arc<dyn AgentDirectory>,
        environment: Arc<dyn EnvironmentProbe>,
        generator: Arc<G>,
        repository: Arc<R>,
    ) -> Self {
        let cache = ResponseCache::new(
            config.response_cache_ttl(),
            config.response_cache_max_entries,
        );
        let delivery = ResponseDelivery::new(config.delivery_window(), config.max_reply_chars);
        let permits = Arc::new(Semaphore::new(config.max_concurrent_replies));
        Self {
            inner: Arc::new(RouterInner {
                config,
                directory,
                environment,
                generator,
                repository,
                trigger: TriggerMatcher::new(),
                cache,
                delivery,
                cooldowns: DashMap::new(),
                permits,
            }),
        }
    }

    /// Replace the active trigger pattern set wholesale.
    pub fn update_trigger_patterns(&self, raw: &[String]) {
        self.inner.trigger.update_patterns(raw);
    }

    pub fn should_trigger(&self, text: &str) -> bool {
        self.inner.trigger.should_trigger(text)
    }

    /// Whether the router-level cooldown currently blocks this agent.
    pub fn is_on_cooldown(&self, id: AgentId) -> bool {
        self.inner
            .cooldowns
            .get(&id)
            .map(|last| last.elapsed() < self.inner.config.reply_cooldown())
            .unwrap_or(false)
    }

    /// Full single-target pipeline for one speech event.
    ///
    /// Relevance filter, proximity query, overheard notifications to every
    /// candidate, nearest-target selection, then a fire-and-forget reply
    /// task for the target. The event is consumed only when at least one
    /// candidate was in range.
    pub fn handle_speech(
        &self,
        event: &SpeechEvent,
        speaker_surface: &Arc<dyn Messenger>,
        radius: f64,
    ) -> SpeechOutcome {
        if !self.inner.trigger.should_trigger(&event.text) {
            return SpeechOutcome::ignored();
        }

        let candidates = self.inner.directory.find_nearby(event.position, radius);
        for candidate in &candidates {
            candidate.overhear(event);
        }

        let Some(target) = select_target(&candidates, event.position) else {
            return SpeechOutcome::ignored();
        };

        let nearby = summarize_nearby(&candidates, &target);
        let target_id = target.id();
        self.spawn_reply(target, event, nearby, Arc::clone(speaker_surface));

        SpeechOutcome {
            consumed: true,
            target: Some(target_id),
            overheard: candidates.len(),
        }
    }

    /// Whole-context batch routing: reply from several nearby agents, not
    /// just the closest one. Agents on cooldown are filtered out and the
    /// batch is capped at the concurrency limit, so one utterance never
    /// fans out into unbounded simultaneous generations.
    pub fn route_conversation(
        &self,
        event: &SpeechEvent,
        speaker_surface: &Arc<dyn Messenger>,
        radius: f64,
    ) -> usize {
        if !self.inner.trigger.should_trigger(&event.text) {
            return 0;
        }

        let candidates = self.inner.directory.find_nearby(event.position, radius);
        let mut routed = 0;
        for candidate in &candidates {
            if routed >= self.inner.config.max_concurrent_replies {
                break;
            }
            if self.is_on_cooldown(candidate.id()) {
                continue;
            }
            let nearby = summarize_nearby(&candidates, candidate);
            if self.spawn_reply(
                Arc::clone(candidate),
                event,
                nearby,
                Arc::clone(speaker_surface),
            ) {
                routed += 1;
            }
        }
        routed
    }

    /// Submit one reply task. Returns `false` when the cooldown dropped
    /// the request (a no-op, not an error).
    fn spawn_reply(
        &self,
        villager: Arc<dyn Villager>,
        event: &SpeechEvent,
        nearby_summary: Option<String>,
        speaker_surface: Arc<dyn Messenger>,
    ) -> bool {
        let id = villager.id();
        if self.is_on_cooldown(id) {
            debug!(agent = %id, "reply request dropped by cooldown");
            return false;
        }
        let inner = Arc::clone(&self.inner);
        let event = event.clone();
        tokio::spawn(async move {
            inner
                .respond(villager, event, nearby_summary, speaker_surface)
                .await;
        });
        true
    }
}

impl<G, R> RouterInner<G, R>
where
    G: TextGenerator + 'static,
    R: InteractionRepository + 'static,
{
    async fn respond(
        &self,
        villager: Arc<dyn Villager>,
        event: SpeechEvent,
        nearby_summary: Option<String>,
        speaker_surface: Arc<dyn Messenger>,
    ) {
        // Admission: queue behind the bounded reply pool.
        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };
        let id = villager.id();

        let key = CacheKey::for_message(id, &event.text);
        if let Some(cached) = self.cache.get(&key) {
            debug!(agent = %id, "serving cached reply");
            self.finish(villager.as_ref(), &event, &cached, speaker_surface.as_ref())
                .await;
            return;
        }

        let ctx = self.build_context(&villager, &event, nearby_summary);
        let memory = villager.memory();
        let recent = memory
            .as_ref()
            .map(|m| m.recent_interactions(PROMPT_HISTORY_DEPTH))
            .unwrap_or_default();
        let villager_name = villager.name().unwrap_or_else(|| "Villager".to_string());
        let request = GenerationRequest {
            prompt: build_prompt(
                &villager_name,
                villager.profession().as_deref(),
                &ctx,
                &recent,
            ),
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        };

        let timeout = self.config.generation_timeout();
        let result = match tokio::time::timeout(timeout, self.generator.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(timeout)),
        };

        // Timeout, provider failure, and blank output are the same thing:
        // no reply this round, and no cooldown/cache side effects.
        let text = match result {
            Ok(response) => {
                let trimmed = response.text.trim().to_string();
                if trimmed.is_empty() {
                    warn!(agent = %id, error = %GenerationError::Empty, "reply generation failed");
                    return;
                }
                trimmed
            }
            Err(e) => {
                warn!(agent = %id, error = %e, "reply generation failed");
                return;
            }
        };

        self.cache.insert(key, text.clone());
        self.finish(villager.as_ref(), &event, &text, speaker_surface.as_ref())
            .await;
    }

    /// Success path shared by cache hits and fresh generations: stamp the
    /// cooldown, deliver, append to the agent's history, and persist.
    async fn finish(
        &self,
        villager: &dyn Villager,
        event: &SpeechEvent,
        text: &str,
        speaker_surface: &dyn Messenger,
    ) {
        let id = villager.id();
        self.cooldowns.insert(id, Instant::now());
        self.delivery.deliver(villager, speaker_surface, text);

        let record = InteractionRecord {
            agent_id: id,
            speaker: event.speaker.clone(),
            utterance: event.text.clone(),
            reply: text.to_string(),
            timestamp: Utc::now(),
        };
        if let Some(memory) = villager.memory() {
            memory.record_interaction(record.clone());
        }
        if let Err(e) = self.repository.append(&record).await {
            warn!(agent = %id, error = %e, "failed to persist interaction");
        }
    }

    fn build_context(
        &self,
        villager: &Arc<dyn Villager>,
        event: &SpeechEvent,
        nearby_summary: Option<String>,
    ) -> ConversationContext {
        let environment = self.environment.snapshot(event.position, &event.world_tag);
        let relationship = villager
            .memory()
            .and_then(|m| m.relationship_with(&event.speaker));
        ConversationContext {
            speaker: event.speaker.clone(),
            message: event.text.clone(),
            timestamp: Utc::now(),
            world_tag: event.world_tag.clone(),
            environment,
            relationship,
            nearby_summary,
        }
    }
}

impl<G, R> Clone for ConversationRouter<G, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G, R> std::fmt::Debug for ConversationRouter<G, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationRouter")
            .field("cached_responses", &self.inner.cache.len())
            .field("agents_on_cooldown", &self.inner.cooldowns.len())
            .finish()
    }
}
