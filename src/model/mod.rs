//! Hosted generative model abstraction
//!
//! The relay talks to the model through [`GenerativeModel`] so tests can
//! substitute a stub for the real Gemini client.

mod gemini;

pub use gemini::{DEFAULT_API_BASE, DEFAULT_MODEL, GeminiClient};

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;

use crate::audio::AudioClip;
use crate::conversation::{Message, Role};
use crate::Result;

/// Sampling parameters for a generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 1000,
            temperature: 0.9,
            top_p: 0.95,
            top_k: 40,
        }
    }
}

/// Inline binary payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

/// One part of a model turn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentPart {
    Text(String),
    InlineData(InlineData),
}

impl ContentPart {
    /// Encode an audio clip as an inline part
    #[must_use]
    pub fn audio(clip: &AudioClip) -> Self {
        Self::InlineData(InlineData {
            mime_type: clip.mime_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&clip.bytes),
        })
    }

    /// Text of this part, if any
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::InlineData(_) => None,
        }
    }
}

/// A turn as sent to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl From<&Message> for Content {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            parts: message
                .parts
                .iter()
                .map(|p| ContentPart::Text(p.text.clone()))
                .collect(),
        }
    }
}

/// A complete, non-streamed generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// A model that turns a conversation into a reply
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate the full reply text for a request
    ///
    /// # Errors
    ///
    /// Returns `Error::Upstream` if the model cannot be reached or its
    /// response carries no text
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Model identifier, for diagnostics
    fn model_id(&self) -> &str;
}
