//! Outbound reply delivery with per-agent rate limiting.
//!
//! This gate is independent from the router's cooldown: the router decides
//! whether an agent is willing to generate at all, delivery decides how
//! often its output actually reaches the actor. A cached or generated
//! reply can still be suppressed here.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

use hamlet_types::agent::AgentId;

use crate::world::{Messenger, Villager};

/// Appended when a reply is cut at the length cap.
const ELLIPSIS: &str = "...";

/// Rate-limited formatter for outbound replies.
pub struct ResponseDelivery {
    window: Duration,
    max_chars: usize,
    last_delivery: DashMap<AgentId, Instant>,
}

impl ResponseDelivery {
    pub fn new(window: Duration, max_chars: usize) -> Self {
        Self {
            window,
            max_chars,
            last_delivery: DashMap::new(),
        }
    }

    /// Deliver `text` as the villager's spoken line. Returns `false` when
    /// the per-agent window suppressed the call. Messenger failures are
    /// logged and swallowed.
    pub fn deliver(&self, villager: &dyn Villager, messenger: &dyn Messenger, text: &str) -> bool {
        let id = villager.id();
        let mut allowed = false;
        // Atomic check-and-stamp under the entry guard.
        self.last_delivery
            .entry(id)
            .and_modify(|last| {
                if last.elapsed() >= self.window {
                    *last = Instant::now();
                    allowed = true;
                }
            })
            .or_insert_with(|| {
                allowed = true;
                Instant::now()
            });

        if !allowed {
            debug!(agent = %id, "reply suppressed by delivery rate limit");
            return false;
        }

        let line = format!("{}: {}", display_label(villager), truncate(text, self.max_chars));
        if let Err(e) = messenger.send(&line) {
            warn!(agent = %id, error = %e, "messaging surface failed");
        }
        true
    }

    /// Forget an agent's delivery timestamp (used when the agent is
    /// cleaned up).
    pub fn forget(&self, id: AgentId) {
        self.last_delivery.remove(&id);
    }
}

/// Name, falling back to profession, falling back to a generic label.
fn display_label(villager: &dyn Villager) -> String {
    villager
        .name()
        .or_else(|| villager.profession())
        .unwrap_or_else(|| "Villager".to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

impl std::fmt::Debug for ResponseDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseDelivery")
            .field("window", &self.window)
            .field("max_chars", &self.max_chars)
            .field("tracked_agents", &self.last_delivery.len())
            .finish()
    }
}
