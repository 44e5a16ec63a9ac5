//! Interactive terminal front end for a running relay

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::recorder::{Toggle, VoiceInput};
use super::relay::RelayApi;
use super::session::{ChatSession, EntryId, Sender};
use super::speech::{SpeechSynthesizer, Utterance, Voice, VoicePreference, menu_label, menu_voices};
use crate::audio::AudioClip;
use crate::Result;

const HELP: &str = "\
Commands:
  /record            start or stop a voice message
  /send <path>       send an audio file as a voice message
  /speak on|off      speak replies aloud
  /voices            list English voices
  /voice <name|auto> choose the reply voice
  /help              show this help
  /quit              leave the chat
Anything else is sent as a message.";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Message(String),
    Record,
    Send(PathBuf),
    Speak(bool),
    Voices,
    Voice(VoicePreference),
    Help,
    Quit,
    Invalid(String),
}

/// Parse a line typed at the prompt; `None` for blank lines
#[must_use]
pub fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Some(Input::Message(line.to_string()));
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    let input = match (name, arg) {
        ("record", "") => Input::Record,
        ("send", "") => Input::Invalid("usage: /send <path>".to_string()),
        ("send", path) => Input::Send(PathBuf::from(path)),
        ("speak", "on") => Input::Speak(true),
        ("speak", "off") => Input::Speak(false),
        ("speak", _) => Input::Invalid("usage: /speak on|off".to_string()),
        ("voices", "") => Input::Voices,
        ("voice", "") => Input::Invalid("usage: /voice <name|auto>".to_string()),
        ("voice", name) => Input::Voice(name.parse().unwrap_or_default()),
        ("help", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        _ => Input::Invalid(format!("unknown command: /{name} (try /help)")),
    };
    Some(input)
}

/// Terminal chat loop
pub struct Terminal {
    relay: Box<dyn RelayApi>,
    speech: Arc<dyn SpeechSynthesizer>,
    voice_input: Option<Box<dyn VoiceInput>>,
    session: ChatSession,
    voices: Option<Vec<Voice>>,
}

impl Terminal {
    #[must_use]
    pub fn new(
        relay: Box<dyn RelayApi>,
        speech: Arc<dyn SpeechSynthesizer>,
        voice_input: Option<Box<dyn VoiceInput>>,
    ) -> Self {
        Self {
            relay,
            speech,
            voice_input,
            session: ChatSession::new(),
            voices: None,
        }
    }

    /// Read lines from stdin until EOF or `/quit`
    ///
    /// # Errors
    ///
    /// Returns error if stdin cannot be read
    pub async fn run(mut self) -> Result<()> {
        println!("Connected. Type a message, or /help for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(voice_input) = self.voice_input.as_mut() {
                voice_input.poll();
            }

            match parse_input(&line) {
                None => {}
                Some(Input::Quit) => break,
                Some(input) => self.handle(input).await,
            }
        }

        self.speech.cancel();
        Ok(())
    }

    async fn handle(&mut self, input: Input) {
        match input {
            Input::Message(text) => self.send_text(&text).await,
            Input::Record => self.toggle_recording().await,
            Input::Send(path) => match AudioClip::from_path(&path).await {
                Ok(clip) => self.send_voice(&clip).await,
                Err(e) => println!("! {e}"),
            },
            Input::Speak(enabled) => {
                self.session.set_voice_replies(enabled);
                if !enabled {
                    self.speech.cancel();
                }
                println!("Spoken replies {}", if enabled { "on" } else { "off" });
            }
            Input::Voices => self.list_voices().await,
            Input::Voice(preference) => {
                println!("Voice set to {preference}");
                self.session.set_voice_preference(preference);
            }
            Input::Help => println!("{HELP}"),
            Input::Invalid(message) => println!("! {message}"),
            Input::Quit => {}
        }
    }

    async fn send_text(&mut self, text: &str) {
        let Some(pending) = self.session.begin_text(text) else {
            return;
        };
        let id = pending.placeholder();
        self.print_entry(id);

        let message = pending.message().unwrap_or_default().to_string();
        let result = self.relay.chat(&message, pending.history()).await;
        let reply = self.session.finish(pending, result);

        self.print_entry(id);
        if let Some(reply) = reply.filter(|r| r.speak) {
            self.speak(&reply.text).await;
        }
    }

    async fn send_voice(&mut self, clip: &AudioClip) {
        let pending = self.session.begin_voice();
        let id = pending.placeholder();
        self.print_entry(id);

        let result = self
            .relay
            .audio_chat(clip, pending.history())
            .await
            .map(|r| r.reply);
        let reply = self.session.finish(pending, result);

        self.print_entry(id);
        if let Some(reply) = reply.filter(|r| r.speak) {
            self.speak(&reply.text).await;
        }
    }

    async fn toggle_recording(&mut self) {
        let Some(voice_input) = self.voice_input.as_mut() else {
            println!("! voice capture is not available in this build; use /send <path>");
            return;
        };

        match voice_input.toggle() {
            Ok(Toggle::Started) => {
                let id = self.session.recording_started();
                self.print_entry(id);
            }
            Ok(Toggle::Stopped(clip)) => self.send_voice(&clip).await,
            Err(e) => {
                let id = self.session.recording_failed(&e);
                self.print_entry(id);
            }
        }
    }

    async fn list_voices(&mut self) {
        let current = self.session.voice_preference().clone();
        let voices = self.voices().await;
        let menu = menu_voices(voices);
        if menu.is_empty() {
            println!("No English voices found; replies use the engine default.");
            return;
        }

        println!("{} auto", marker(current == VoicePreference::Auto));
        for voice in menu {
            let selected = current == VoicePreference::Named(voice.name.clone());
            println!("{} {}", marker(selected), menu_label(voice));
        }
    }

    async fn voices(&mut self) -> &[Voice] {
        if self.voices.is_none() {
            let loaded = match self.speech.voices().await {
                Ok(voices) => voices,
                Err(e) => {
                    tracing::warn!(error = %e, "could not list synthesis voices");
                    Vec::new()
                }
            };
            self.voices = Some(loaded);
        }
        self.voices.as_deref().unwrap_or_default()
    }

    async fn speak(&mut self, text: &str) {
        let preference = self.session.voice_preference().clone();
        let utterance = Utterance::prepare(text, self.voices().await, &preference);
        let speech = Arc::clone(&self.speech);

        tokio::spawn(async move {
            if let Err(e) = speech.speak(&utterance).await {
                tracing::warn!(error = %e, "speech failed");
            }
        });
    }

    fn print_entry(&self, id: EntryId) {
        if let Some(entry) = self.session.transcript().get(id) {
            let who = match entry.sender {
                Sender::User => "you",
                Sender::Bot => "gemini",
            };
            println!("{who}> {}", entry.text);
        }
    }
}

const fn marker(selected: bool) -> &'static str {
    if selected { "*" } else { " " }
}
