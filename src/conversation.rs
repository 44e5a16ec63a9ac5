//! Conversation messages exchanged between the client and the relay

use serde::{Deserialize, Serialize};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single text fragment of a message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Part {
    pub text: String,
}

/// One turn of a conversation
///
/// Serializes as `{"role": "user", "parts": [{"text": "..."}]}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    /// Build a single-part message
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Build a user turn
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Build a model turn
    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Concatenated text of all parts
    #[must_use]
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Parse a history value sent as JSON
///
/// # Errors
///
/// Returns error if the value is not an array of messages
pub fn history_from_value(value: serde_json::Value) -> crate::Result<Vec<Message>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse the `history` form field of an audio upload
///
/// Anything that is not a JSON message array degrades to an empty history.
#[must_use]
pub fn history_from_field(raw: Option<&str>) -> Vec<Message> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Message>>(raw) {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse history, continuing with empty history");
            Vec::new()
        }
    }
}
