//! Conversation orchestration
//!
//! A [`ChatSession`] owns the history and the rendered transcript. Every
//! request is split into `begin_*` and [`ChatSession::finish`], linked by a
//! [`PendingReply`] that names the placeholder entry it will replace. Two
//! requests in flight therefore never touch each other's placeholder.

use super::relay::RelayApi;
use super::speech::VoicePreference;
use crate::audio::AudioClip;
use crate::conversation::Message;
use crate::Error;

/// Placeholder shown while a text reply is pending
pub const THINKING: &str = "Gemini is thinking...";

/// Placeholder shown while a voice reply is pending
pub const PROCESSING_VOICE: &str = "Processing your voice message...";

/// Notice shown while the microphone is recording
pub const RECORDING: &str = "🎤 Recording... (toggle again to stop)";

/// Transcript entry standing in for an uploaded clip
pub const VOICE_SENT: &str = "🎵 Voice message sent";

/// History text recorded for a voice turn
pub const VOICE_HISTORY_TEXT: &str = "[Voice message]";

/// Shown when a text request fails
pub const CHAT_FAILED: &str = "Sorry, something went wrong. Please try again.";

/// Shown when a voice upload fails
pub const VOICE_FAILED: &str = "Sorry, I couldn't process your voice message. Please try again.";

/// Shown when the microphone cannot be opened
pub const MIC_DENIED: &str =
    "Sorry, I couldn't access your microphone. Please check your permissions.";

/// Stable identifier of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// Who a transcript entry is shown as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One rendered line of the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub sender: Sender,
    pub text: String,
}

/// Rendered chat, in display order
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Transcript {
    /// Append an entry and return its id
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            sender,
            text: text.into(),
        });
        id
    }

    /// Replace the text of an entry in place
    pub fn replace(&mut self, id: EntryId, text: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Remove an entry
    pub fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Look up an entry
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries in display order
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

#[derive(Debug, Clone)]
enum PendingKind {
    Text(String),
    Voice,
}

/// A request in flight, correlated to its placeholder entry
#[derive(Debug)]
#[must_use = "a pending reply must be passed to ChatSession::finish"]
pub struct PendingReply {
    placeholder: EntryId,
    kind: PendingKind,
    history: Vec<Message>,
}

impl PendingReply {
    /// Placeholder entry this request will replace
    #[must_use]
    pub const fn placeholder(&self) -> EntryId {
        self.placeholder
    }

    /// Text message being sent, if this is a text request
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            PendingKind::Text(text) => Some(text),
            PendingKind::Voice => None,
        }
    }

    /// History snapshot to send along with the request
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

/// A completed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub entry: EntryId,
    pub text: String,
    /// Whether the caller should speak this reply
    pub speak: bool,
}

/// Client-side conversation state for one chat
#[derive(Debug, Default)]
pub struct ChatSession {
    history: Vec<Message>,
    transcript: Transcript,
    voice_replies: bool,
    voice_preference: VoicePreference,
    recording_notice: Option<EntryId>,
}

impl ChatSession {
    /// Start an empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation history, oldest first
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Rendered chat
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether replies are spoken aloud
    #[must_use]
    pub const fn voice_replies(&self) -> bool {
        self.voice_replies
    }

    /// Turn spoken replies on or off
    pub const fn set_voice_replies(&mut self, enabled: bool) {
        self.voice_replies = enabled;
    }

    /// Selected synthesis voice
    #[must_use]
    pub const fn voice_preference(&self) -> &VoicePreference {
        &self.voice_preference
    }

    /// Select a synthesis voice
    pub fn set_voice_preference(&mut self, preference: VoicePreference) {
        self.voice_preference = preference;
    }

    /// Render a bot-side notice
    pub fn notice(&mut self, text: impl Into<String>) -> EntryId {
        self.transcript.push(Sender::Bot, text)
    }

    /// Render the recording notice
    pub fn recording_started(&mut self) -> EntryId {
        let id = self.transcript.push(Sender::User, RECORDING);
        self.recording_notice = Some(id);
        id
    }

    /// Render a recorder failure as a chat message
    pub fn recording_failed(&mut self, error: &Error) -> EntryId {
        tracing::warn!(error = %error, "voice capture failed");
        self.clear_recording_notice();
        match error {
            Error::PermissionDenied(_) => self.notice(MIC_DENIED),
            _ => self.notice(VOICE_FAILED),
        }
    }

    fn clear_recording_notice(&mut self) {
        if let Some(id) = self.recording_notice.take() {
            self.transcript.remove(id);
        }
    }

    /// Render a text submission and its placeholder
    ///
    /// Returns `None` for blank input.
    pub fn begin_text(&mut self, text: &str) -> Option<PendingReply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.transcript.push(Sender::User, text);
        let placeholder = self.transcript.push(Sender::Bot, THINKING);

        Some(PendingReply {
            placeholder,
            kind: PendingKind::Text(text.to_string()),
            history: self.history.clone(),
        })
    }

    /// Render a voice submission and its placeholder
    pub fn begin_voice(&mut self) -> PendingReply {
        self.clear_recording_notice();
        self.transcript.push(Sender::User, VOICE_SENT);
        let placeholder = self.transcript.push(Sender::Bot, PROCESSING_VOICE);

        PendingReply {
            placeholder,
            kind: PendingKind::Voice,
            history: self.history.clone(),
        }
    }

    /// Resolve a pending request
    ///
    /// On success the placeholder becomes the reply and the turn pair is
    /// appended to history. On failure the placeholder becomes an apology
    /// and history is untouched.
    pub fn finish(&mut self, pending: PendingReply, result: crate::Result<String>) -> Option<Reply> {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                let apology = match pending.kind {
                    PendingKind::Text(_) => CHAT_FAILED,
                    PendingKind::Voice => VOICE_FAILED,
                };
                self.transcript.replace(pending.placeholder, apology);
                return None;
            }
        };

        self.transcript.replace(pending.placeholder, reply.clone());

        let user_text = match pending.kind {
            PendingKind::Text(text) => text,
            PendingKind::Voice => {
                // A voice turn keeps the conversation spoken
                self.voice_replies = true;
                VOICE_HISTORY_TEXT.to_string()
            }
        };

        self.history.push(Message::user(user_text));
        self.history.push(Message::model(reply.clone()));

        Some(Reply {
            entry: pending.placeholder,
            text: reply,
            speak: self.voice_replies,
        })
    }

    /// Send a text message through the relay and record the outcome
    pub async fn send_text(&mut self, relay: &dyn RelayApi, text: &str) -> Option<Reply> {
        let pending = self.begin_text(text)?;
        let message = pending.message().unwrap_or_default().to_string();
        let result = relay.chat(&message, pending.history()).await;
        self.finish(pending, result)
    }

    /// Upload a voice clip through the relay and record the outcome
    pub async fn send_voice(&mut self, relay: &dyn RelayApi, clip: &AudioClip) -> Option<Reply> {
        let pending = self.begin_voice();
        let result = relay
            .audio_chat(clip, pending.history())
            .await
            .map(|r| r.reply);
        self.finish(pending, result)
    }
}
