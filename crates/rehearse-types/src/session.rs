//! Practice sessions.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persona::Persona;

/// Lifecycle of a practice session.
///
/// The client only ever moves a session from `Active` to `Completed` through
/// the explicit end action. `Abandoned` is set server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

/// The persona a session is bound to.
///
/// List and create responses carry the bare persona id, the detail response
/// embeds the whole persona.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PersonaRef {
    Id(String),
    Detail(Box<Persona>),
}

impl PersonaRef {
    pub fn id(&self) -> &str {
        match self {
            PersonaRef::Id(id) => id,
            PersonaRef::Detail(persona) => &persona.id,
        }
    }

    pub fn persona(&self) -> Option<&Persona> {
        match self {
            PersonaRef::Id(_) => None,
            PersonaRef::Detail(persona) => Some(persona),
        }
    }
}

impl<'de> Deserialize<'de> for PersonaRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(id) => Ok(PersonaRef::Id(id)),
            Value::Number(n) => Ok(PersonaRef::Id(n.to_string())),
            Value::Object(map) => serde_json::from_value(Value::Object(map))
                .map(|persona| PersonaRef::Detail(Box::new(persona)))
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "invalid persona reference: {other}"
            ))),
        }
    }
}

/// A practice session as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(deserialize_with = "crate::id::deserialize")]
    pub id: String,
    pub persona: PersonaRef,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Display name of the persona (list responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_messages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Best display name for the bound persona.
    pub fn persona_label(&self) -> &str {
        self.persona
            .persona()
            .map(|p| p.name.as_str())
            .or(self.persona_name.as_deref())
            .unwrap_or_else(|| self.persona.id())
    }
}

/// Conversation mode requested at creation. Only chat is driven by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Chat,
}

/// Body of `POST /sessions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub persona: String,
    pub mode: SessionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl CreateSessionRequest {
    /// Builds a chat-mode request; a blank prompt is omitted from the body.
    pub fn chat(persona: impl Into<String>, custom_prompt: &str) -> Self {
        let prompt = custom_prompt.trim();
        Self {
            persona: persona.into(),
            mode: SessionMode::Chat,
            custom_prompt: (!prompt.is_empty()).then(|| prompt.to_string()),
        }
    }
}

/// Body of `POST /sessions/{id}/end/`. Both fields are optional; an empty
/// request serializes to `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndSessionRequest {
    /// 1 to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl EndSessionRequest {
    pub const MAX_FEEDBACK: usize = 2000;

    /// Returns `None` when `rating` is outside 1..=5.
    pub fn rated(rating: u8) -> Option<Self> {
        (1..=5).contains(&rating).then_some(Self {
            rating: Some(rating),
            feedback: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_session_accepts_bare_persona_id() {
        let session: Session = serde_json::from_value(json!({
            "id": "s1",
            "persona": "p1",
            "persona_name": "Mrs. Lan",
            "status": "active"
        }))
        .unwrap();

        assert_eq!(session.persona.id(), "p1");
        assert_eq!(session.persona_label(), "Mrs. Lan");
        assert!(session.status.is_active());
    }

    #[test]
    fn test_session_accepts_nested_persona() {
        let session: Session = serde_json::from_value(json!({
            "id": "s1",
            "persona": {"id": "p1", "name": "Mr. Binh", "difficulty_level": "easy"},
            "status": "completed",
            "rating": 4
        }))
        .unwrap();

        assert_eq!(session.persona.id(), "p1");
        assert_eq!(session.persona_label(), "Mr. Binh");
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.rating, Some(4));
    }

    #[test]
    fn test_create_request_omits_blank_prompt() {
        let body = serde_json::to_value(CreateSessionRequest::chat("p1", "   ")).unwrap();
        assert_eq!(body, json!({"persona": "p1", "mode": "chat"}));

        let body = serde_json::to_value(CreateSessionRequest::chat("p1", " Be terse. ")).unwrap();
        assert_eq!(
            body,
            json!({"persona": "p1", "mode": "chat", "custom_prompt": "Be terse."})
        );
    }

    #[test]
    fn test_end_request_body() {
        let body = serde_json::to_value(EndSessionRequest::default()).unwrap();
        assert_eq!(body, json!({}));

        let body = serde_json::to_value(EndSessionRequest::rated(4).unwrap()).unwrap();
        assert_eq!(body, json!({"rating": 4}));

        assert!(EndSessionRequest::rated(0).is_none());
        assert!(EndSessionRequest::rated(6).is_none());
    }
}
