//! Audio chat endpoint
//!
//! Uploads are filtered by [`AudioChatForm`] while the multipart body is
//! read, so disallowed types and oversized files never reach the handler.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::StatusCode,
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::ApiError;
use crate::audio::{AudioClip, MAX_AUDIO_BYTES, is_allowed_mime};
use crate::conversation::history_from_field;
use crate::persona::TRANSCRIPTION_PLACEHOLDER;

/// Headroom above the file limit for the history field and multipart framing
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build audio chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/api/audio-chat",
            post(audio_chat).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .with_state(state)
}

/// Audio chat response body
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioChatResponse {
    pub reply: String,
    pub transcription: String,
}

/// Parsed and filtered multipart upload
#[derive(Debug)]
pub struct AudioChatForm {
    pub audio: Option<AudioClip>,
    pub history: Option<String>,
}

impl<S> FromRequest<S> for AudioChatForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "rejected audio upload body");
            ApiError::Transport(e.status(), "Invalid multipart body")
        })?;

        let mut form = Self {
            audio: None,
            history: None,
        };

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "audio" if field.file_name().is_none() => {
                    tracing::debug!("ignoring non-file audio field");
                }
                "audio" => {
                    if form.audio.is_some() {
                        return Err(ApiError::BadRequest("Unexpected field"));
                    }

                    let mime_type = field.content_type().unwrap_or_default().to_string();
                    if !is_allowed_mime(&mime_type) {
                        tracing::warn!(mime_type = %mime_type, "rejected audio upload type");
                        return Err(ApiError::UnsupportedMedia(
                            "Invalid file type. Only audio files are allowed.",
                        ));
                    }
                    let file_name = field.file_name().map(ToString::to_string);

                    let mut bytes = Vec::new();
                    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                        if bytes.len() + chunk.len() > MAX_AUDIO_BYTES {
                            tracing::warn!(limit = MAX_AUDIO_BYTES, "rejected oversized audio upload");
                            return Err(too_large());
                        }
                        bytes.extend_from_slice(&chunk);
                    }

                    let mut clip = AudioClip::new(bytes, mime_type);
                    clip.file_name = file_name;
                    form.audio = Some(clip);
                }
                "history" => {
                    form.history = Some(field.text().await.map_err(multipart_error)?);
                }
                other => {
                    tracing::debug!(field = other, "ignoring unknown form field");
                }
            }
        }

        Ok(form)
    }
}

const fn too_large() -> ApiError {
    ApiError::PayloadTooLarge("Audio file exceeds the 10MB limit")
}

fn multipart_error(e: MultipartError) -> ApiError {
    let status = e.status();
    tracing::debug!(error = %e, %status, "multipart read failed");
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        ApiError::Transport(status, "Invalid multipart body")
    }
}

/// Reply to an uploaded voice message
async fn audio_chat(
    State(state): State<Arc<ApiState>>,
    form: AudioChatForm,
) -> Result<Json<AudioChatResponse>, ApiError> {
    let clip = form
        .audio
        .filter(|clip| !clip.bytes.is_empty())
        .ok_or(ApiError::BadRequest("Audio file is required"))?;

    let history = history_from_field(form.history.as_deref());

    tracing::debug!(
        audio_bytes = clip.bytes.len(),
        mime_type = %clip.mime_type,
        history_len = history.len(),
        "audio chat request"
    );

    let reply = state
        .chat
        .reply_to_audio(&history, &clip)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "error processing audio");
            ApiError::Upstream("Failed to process audio")
        })?;

    Ok(Json(AudioChatResponse {
        reply,
        transcription: TRANSCRIPTION_PLACEHOLDER.to_string(),
    }))
}
