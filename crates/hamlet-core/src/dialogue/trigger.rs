//! AI-trigger detection over inbound chat text.
//!
//! The pattern set is data: it can be replaced wholesale at runtime, and
//! patterns that fail to compile are dropped with a warning rather than
//! rejecting the whole set.

use std::sync::RwLock;

use regex::Regex;
use tracing::warn;

/// Patterns active when no custom set has been installed.
pub const DEFAULT_TRIGGER_PATTERNS: &[&str] = &[
    r"(?i)\b(hello|hi|hey|greetings)\b",
    r"(?i)\bgood\s+(morning|day|evening)\b",
    r"(?i)\bvillagers?\b",
    r"(?i)\bhow\s+are\s+you\b",
    r"\?\s*$",
];

/// Decides whether a chat line is directed at the AI layer.
pub struct TriggerMatcher {
    patterns: RwLock<Vec<Regex>>,
}

impl TriggerMatcher {
    /// Matcher with the default trigger patterns.
    pub fn new() -> Self {
        let matcher = Self {
            patterns: RwLock::new(Vec::new()),
        };
        let defaults: Vec<String> = DEFAULT_TRIGGER_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        matcher.update_patterns(&defaults);
        matcher
    }

    /// True iff any active pattern matches. Blank text never triggers.
    pub fn should_trigger(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.read().iter().any(|p| p.is_match(text))
    }

    /// Replace the whole pattern set. Patterns that fail to compile are
    /// dropped with a warning; the rest take effect.
    pub fn update_patterns(&self, raw: &[String]) {
        let compiled: Vec<Regex> = raw
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "dropping invalid trigger pattern");
                    None
                }
            })
            .collect();
        *self.write() = compiled;
    }

    pub fn pattern_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Regex>> {
        self.patterns.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Regex>> {
        self.patterns.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TriggerMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TriggerMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerMatcher")
            .field("pattern_count", &self.pattern_count())
            .finish()
    }
}
