//! Audio clips and upload rules shared by the relay and the client

use std::path::Path;

use crate::{Error, Result};

/// Largest accepted audio upload (10 MiB)
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// MIME types accepted for audio uploads
pub const ALLOWED_AUDIO_TYPES: &[&str] = &[
    "audio/wav",
    "audio/mp3",
    "audio/webm",
    "audio/ogg",
    "audio/m4a",
];

/// Sample rate for native microphone capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// A recorded or uploaded audio clip, alive for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl AudioClip {
    /// Create a clip from raw bytes
    #[must_use]
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: None,
        }
    }

    /// Attach a file name used for multipart uploads
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Load a clip from disk, inferring the MIME type from the extension
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or has an unknown extension
    pub async fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_for_path(path).ok_or_else(|| {
            Error::Audio(format!("unsupported audio file: {}", path.display()))
        })?;
        let bytes = tokio::fs::read(path).await?;
        let clip = Self::new(bytes, mime_type);
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => clip.with_file_name(name),
            None => clip,
        })
    }

    /// File name to present in uploads
    #[must_use]
    pub fn upload_name(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| {
            let ext = mime_essence(&self.mime_type)
                .strip_prefix("audio/")
                .unwrap_or("bin")
                .to_string();
            format!("voice-message.{ext}")
        })
    }
}

/// MIME type without parameters, lowercased
#[must_use]
pub fn mime_essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Whether an upload with this MIME type is accepted
#[must_use]
pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_AUDIO_TYPES.contains(&mime_essence(mime).as_str())
}

/// Map a file extension to one of the accepted MIME types
#[must_use]
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mp3"),
        "webm" => Some("audio/webm"),
        "ogg" | "oga" => Some("audio/ogg"),
        "m4a" => Some("audio/m4a"),
        _ => None,
    }
}

/// Convert f32 samples to WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
