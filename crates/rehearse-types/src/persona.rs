//! Persona profiles: the synthetic counterpart a user rehearses with.

use serde::{Deserialize, Serialize};

/// How hard the persona is to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Returns the short display name for this level.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

/// Personality archetype driving the counterpart's behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Friendly,
    Strict,
    Anxious,
    Demanding,
    Supportive,
    Skeptical,
    Busy,
}

impl Personality {
    pub fn label(&self) -> &'static str {
        match self {
            Personality::Friendly => "friendly",
            Personality::Strict => "strict",
            Personality::Anxious => "anxious",
            Personality::Demanding => "demanding",
            Personality::Supportive => "supportive",
            Personality::Skeptical => "skeptical",
            Personality::Busy => "busy",
        }
    }
}

fn default_active() -> bool {
    true
}

/// A persona as listed by the backend.
///
/// Read-only on the client: personas are fetched, never edited locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(deserialize_with = "crate::id::deserialize")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "difficulty_level", default)]
    pub difficulty: Difficulty,
    #[serde(rename = "personality_type", default)]
    pub personality: Personality,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
