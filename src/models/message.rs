use serde_json::{Map, Value};

use super::content::Content;
use super::role::Role;
use crate::errors::ShapeError;

/// One conversational turn: a role tag plus typed content.
///
/// Messages are plain immutable data. A render call produces a fresh list of
/// them and hands it to the caller; nothing in the engine keeps a reference.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    /// Create a message. Plain strings are wrapped as text content.
    pub fn new<C: Into<Content>>(role: Role, content: C) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user<C: Into<Content>>(content: C) -> Self {
        Message::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant<C: Into<Content>>(content: C) -> Self {
        Message::new(Role::Assistant, content)
    }

    /// Strictly validate untyped mapping data as one of the two message
    /// shapes. The role must be exactly "user" or "assistant"; the content
    /// must be a plain string (wrapped as text) or a tagged content payload.
    pub fn from_record(record: &Map<String, Value>) -> Result<Self, ShapeError> {
        let role = match record.get("role").and_then(Value::as_str) {
            Some("user") => Role::User,
            Some("assistant") => Role::Assistant,
            _ => return Err(ShapeError::InvalidRole),
        };

        let content = match record.get("content") {
            Some(Value::String(text)) => Content::text(text.clone()),
            Some(value) => serde_json::from_value::<Content>(value.clone())
                .map_err(|e| ShapeError::InvalidContent(e.to_string()))?,
            None => return Err(ShapeError::MissingContent),
        };

        Ok(Message { role, content })
    }
}
