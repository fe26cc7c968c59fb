//! Conversation value objects: inbound speech events, the per-event context
//! bundle handed to the prompt builder, and the routing outcome.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Position};

/// Coarse time-of-day bucket reported by the simulation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Midday,
    Evening,
    Night,
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDay::Morning => write!(f, "morning"),
            TimeOfDay::Midday => write!(f, "midday"),
            TimeOfDay::Evening => write!(f, "evening"),
            TimeOfDay::Night => write!(f, "night"),
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" => Ok(TimeOfDay::Morning),
            "midday" => Ok(TimeOfDay::Midday),
            "evening" => Ok(TimeOfDay::Evening),
            "night" => Ok(TimeOfDay::Night),
            other => Err(format!("invalid time of day: '{other}'")),
        }
    }
}

/// Weather state reported by the simulation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Rain,
    Thunder,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weather::Clear => write!(f, "clear"),
            Weather::Rain => write!(f, "rain"),
            Weather::Thunder => write!(f, "thunder"),
        }
    }
}

impl FromStr for Weather {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clear" => Ok(Weather::Clear),
            "rain" => Ok(Weather::Rain),
            "thunder" => Ok(Weather::Thunder),
            other => Err(format!("invalid weather: '{other}'")),
        }
    }
}

/// Snapshot of the environment around a position, queried once per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
    /// Human-readable location label ("the village square", "near the mill").
    pub location_label: String,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            time_of_day: TimeOfDay::Midday,
            weather: Weather::Clear,
            location_label: "the village".to_string(),
        }
    }
}

/// An inbound natural-language event from an external actor.
#[derive(Debug, Clone)]
pub struct SpeechEvent {
    /// Display name of the speaking actor.
    pub speaker: String,
    pub text: String,
    pub position: Position,
    /// World/dimension tag the event originated in.
    pub world_tag: String,
}

/// Everything the prompt builder needs for one exchange.
///
/// Constructed per event, never persisted.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub speaker: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub world_tag: String,
    pub environment: EnvironmentSnapshot,
    /// Relationship label the target agent holds toward the speaker.
    pub relationship: Option<String>,
    /// Short summary of other agents in earshot ("Brigid and 2 others").
    pub nearby_summary: Option<String>,
}

/// What the dialogue pipeline did with a speech event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechOutcome {
    /// True when the event should not fall through to default broadcast.
    pub consumed: bool,
    /// The agent chosen to answer, if any candidate was in range.
    pub target: Option<AgentId>,
    /// How many agents overheard the event.
    pub overheard: usize,
}

impl SpeechOutcome {
    pub fn ignored() -> Self {
        Self {
            consumed: false,
            target: None,
            overheard: 0,
        }
    }
}
