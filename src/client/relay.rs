//! HTTP client for the relay endpoints

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::conversation::Message;
use crate::{Error, Result};

/// Reply to an uploaded voice message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AudioReply {
    pub reply: String,
    pub transcription: String,
}

/// Something that can answer chat turns on behalf of the session
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Send a text message with the prior history
    async fn chat(&self, message: &str, history: &[Message]) -> Result<String>;

    /// Upload an audio clip with the prior history
    async fn audio_chat(&self, clip: &AudioClip, history: &[Message]) -> Result<AudioReply>;
}

/// Talks to a running relay over HTTP
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    message: &'a str,
    history: &'a [Message],
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

impl RelayClient {
    /// Create a client for the relay at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn chat(&self, message: &str, history: &[Message]) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&ChatBody { message, history })
            .send()
            .await
            .map_err(|e| Error::Relay(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Relay(format!("HTTP error! status: {}", response.status())));
        }

        let body: ChatReply = response.json().await?;
        Ok(body.reply)
    }

    async fn audio_chat(&self, clip: &AudioClip, history: &[Message]) -> Result<AudioReply> {
        let part = reqwest::multipart::Part::bytes(clip.bytes.clone())
            .file_name(clip.upload_name())
            .mime_str(&clip.mime_type)
            .map_err(|e| Error::Upload(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("audio", part)
            .text("history", serde_json::to_string(history)?);

        tracing::debug!(audio_bytes = clip.bytes.len(), "uploading voice message");

        let response = self
            .client
            .post(self.url("/api/audio-chat"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Upload(format!("HTTP error! status: {}", response.status())));
        }

        Ok(response.json().await?)
    }
}
