//! Conversation messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Voice,
    Image,
}

/// A single transcript message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "crate::id::deserialize")]
    pub id: String,
    /// Owning session. The messages endpoint omits it, the caller knows it.
    #[serde(
        default,
        deserialize_with = "crate::id::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub session: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// System prompts are stored with the session but never shown.
    pub fn is_visible(&self) -> bool {
        self.role != Role::System
    }
}

/// Body of `POST /sessions/{id}/add_message/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMessageRequest {
    pub role: Role,
    pub content: String,
    pub message_type: MessageType,
}

impl AddMessageRequest {
    pub fn user_text(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            message_type: MessageType::Text,
        }
    }
}

/// Response of `add_message`; carries the counterpart's reply when one was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddMessageReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_message: Option<Message>,
}
