//! Speech through the platform's command-line synthesizer
//!
//! `say` on macOS, `espeak-ng` elsewhere. Text is passed on stdin.

use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use super::speech::{SpeechSynthesizer, Utterance, Voice};
use crate::{Error, Result};

/// Words per minute both engines use at rate 1.0
const BASE_WPM: f32 = 175.0;

/// Which synthesizer binary to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Say,
    EspeakNg,
}

impl Backend {
    /// The usual engine for this platform
    #[must_use]
    pub const fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Say
        } else {
            Self::EspeakNg
        }
    }

    const fn program(self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::EspeakNg => "espeak-ng",
        }
    }

    fn list_args(self) -> &'static [&'static str] {
        match self {
            Self::Say => &["-v", "?"],
            Self::EspeakNg => &["--voices"],
        }
    }

    fn parse_voices(self, listing: &str) -> Vec<Voice> {
        match self {
            Self::Say => parse_say_voices(listing),
            Self::EspeakNg => parse_espeak_voices(listing),
        }
    }

    /// Arguments to speak `utterance`, reading the text from stdin
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn speak_args(self, utterance: &Utterance) -> Vec<String> {
        let tuning = utterance.tuning;
        let wpm = (BASE_WPM * tuning.rate).round().max(1.0) as u32;
        let mut args = Vec::new();

        if let Some(voice) = &utterance.voice {
            args.push("-v".to_string());
            args.push(voice.name.clone());
        }

        match self {
            Self::Say => {
                args.extend(["-r".to_string(), wpm.to_string()]);
                args.extend(["-f".to_string(), "-".to_string()]);
            }
            Self::EspeakNg => {
                let pitch = (50.0 * tuning.pitch).round().clamp(0.0, 99.0) as u32;
                let amplitude = (100.0 * tuning.volume).round().clamp(0.0, 200.0) as u32;
                args.extend(["-s".to_string(), wpm.to_string()]);
                args.extend(["-p".to_string(), pitch.to_string()]);
                args.extend(["-a".to_string(), amplitude.to_string()]);
                args.push("--stdin".to_string());
            }
        }

        args
    }
}

/// Parse `say -v ?` output: `Name   lang   # sample sentence`
fn parse_say_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            (!name.is_empty() && !lang.is_empty()).then(|| Voice::new(name, lang))
        })
        .collect()
}

/// Parse `espeak-ng --voices` output, skipping the header row
fn parse_espeak_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let lang = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice::new(name, lang))
        })
        .collect()
}

/// A [`SpeechSynthesizer`] backed by a local command
#[derive(Debug, Clone)]
pub struct SystemSpeech {
    backend: Backend,
    cancel: Arc<Notify>,
}

impl Default for SystemSpeech {
    fn default() -> Self {
        Self::new(Backend::platform_default())
    }
}

impl SystemSpeech {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            cancel: Arc::new(Notify::new()),
        }
    }

    fn spawn_error(&self, e: &std::io::Error) -> Error {
        Error::Speech(format!("failed to run {}: {e}", self.backend.program()))
    }
}

#[async_trait]
impl SpeechSynthesizer for SystemSpeech {
    async fn voices(&self) -> Result<Vec<Voice>> {
        let output = Command::new(self.backend.program())
            .args(self.backend.list_args())
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        if !output.status.success() {
            return Err(Error::Speech(format!(
                "{} exited with {}",
                self.backend.program(),
                output.status
            )));
        }

        let voices = self
            .backend
            .parse_voices(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(count = voices.len(), "loaded synthesis voices");
        Ok(voices)
    }

    async fn speak(&self, utterance: &Utterance) -> Result<()> {
        self.cancel();

        if utterance.text.is_empty() {
            return Ok(());
        }

        // Registered before spawning so a cancel during startup is not lost
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        let mut child = Command::new(self.backend.program())
            .args(self.backend.speak_args(utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(utterance.text.as_bytes()).await?;
        }

        match finish_or_cancel(child, cancelled).await? {
            Some(status) if !status.success() => Err(Error::Speech(format!(
                "{} exited with {status}",
                self.backend.program()
            ))),
            Some(_) => Ok(()),
            None => {
                tracing::debug!("speech cancelled");
                Ok(())
            }
        }
    }

    fn cancel(&self) {
        self.cancel.notify_waiters();
    }
}

/// Wait for `child` to exit, or kill it once `cancelled` fires
///
/// Returns `None` when the child was cancelled.
async fn finish_or_cancel(
    mut child: Child,
    cancelled: Pin<&mut Notified<'_>>,
) -> Result<Option<ExitStatus>> {
    let finished = tokio::select! {
        status = child.wait() => Some(status?),
        () = cancelled => None,
    };

    if finished.is_none() {
        child.kill().await?;
    }
    Ok(finished)
}
