//! Voice selection and text cleanup for spoken replies

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::Result;

/// A synthesis voice reported by the local speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 style language tag (e.g. "en-US", "en_GB")
    pub lang: String,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }

    fn lang_starts_with(&self, prefix: &str) -> bool {
        normalize_lang(&self.lang).starts_with(&normalize_lang(prefix))
    }

    fn is_english(&self) -> bool {
        self.lang_starts_with("en")
    }

    fn is_enhanced(&self) -> bool {
        self.name_contains("enhanced") || self.name_contains("premium")
    }
}

fn normalize_lang(lang: &str) -> String {
    lang.replace('_', "-").to_lowercase()
}

/// Which voice the user wants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VoicePreference {
    /// Pick the best available voice
    #[default]
    Auto,
    /// A specific voice by exact name
    Named(String),
}

impl FromStr for VoicePreference {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Named(s.to_string()))
        }
    }
}

impl fmt::Display for VoicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

enum Priority {
    Name(&'static str),
    EnglishFemale,
    Lang(&'static str),
}

/// Most natural-sounding voices first
const VOICE_PRIORITY: &[Priority] = &[
    // macOS high-quality voices
    Priority::Name("Samantha (Enhanced)"),
    Priority::Name("Alex (Enhanced)"),
    Priority::Name("Ava (Enhanced)"),
    Priority::Name("Allison (Enhanced)"),
    Priority::Name("Susan (Enhanced)"),
    Priority::Name("Victoria (Enhanced)"),
    // Standard macOS voices
    Priority::Name("Samantha"),
    Priority::Name("Alex"),
    Priority::Name("Ava"),
    Priority::Name("Allison"),
    Priority::Name("Susan"),
    Priority::Name("Victoria"),
    Priority::Name("Google UK English Female"),
    Priority::Name("Google US English Female"),
    Priority::Name("Google UK English Male"),
    Priority::Name("Google US English Male"),
    Priority::Name("Microsoft Zira Desktop"),
    Priority::Name("Microsoft David Desktop"),
    Priority::EnglishFemale,
    Priority::Lang("en-US"),
    Priority::Lang("en-GB"),
    Priority::Lang("en"),
];

impl Priority {
    fn matches(&self, voice: &Voice) -> bool {
        match self {
            Self::Name(name) => voice.name_contains(name),
            Self::EnglishFemale => voice.is_english() && voice.name_contains("female"),
            Self::Lang(prefix) => voice.lang_starts_with(prefix),
        }
    }
}

/// Choose a voice: explicit preference, then the priority list
///
/// Returns `None` when nothing fits, meaning the engine default.
#[must_use]
pub fn select_voice<'a>(voices: &'a [Voice], preference: &VoicePreference) -> Option<&'a Voice> {
    if let VoicePreference::Named(name) = preference {
        if let Some(voice) = voices.iter().find(|v| &v.name == name) {
            return Some(voice);
        }
        tracing::debug!(voice = %name, "preferred voice unavailable, falling back");
    }

    VOICE_PRIORITY
        .iter()
        .find_map(|priority| voices.iter().find(|v| priority.matches(v)))
}

/// English voices for a picker, enhanced/premium first then by name
#[must_use]
pub fn menu_voices(voices: &[Voice]) -> Vec<&Voice> {
    let mut english: Vec<&Voice> = voices.iter().filter(|v| v.is_english()).collect();
    english.sort_by(|a, b| {
        b.is_enhanced()
            .cmp(&a.is_enhanced())
            .then_with(|| a.name.cmp(&b.name))
    });
    english
}

/// Picker label, starred for enhanced voices
#[must_use]
pub fn menu_label(voice: &Voice) -> String {
    if voice.is_enhanced() {
        format!("{} ⭐", voice.name)
    } else {
        voice.name.clone()
    }
}

/// Playback parameters, as multipliers of the engine defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            rate: 0.95,
            pitch: 1.0,
            volume: 0.9,
        }
    }
}

/// Per-voice tuning keyed on name substrings
#[must_use]
pub fn tuning_for(voice: Option<&Voice>) -> Tuning {
    let base = Tuning::default();
    let Some(voice) = voice else {
        return base;
    };

    let (rate, pitch) = if voice.is_enhanced() {
        (0.9, 0.95)
    } else if voice.name_contains("google") {
        (1.0, 1.0)
    } else if voice.name_contains("samantha") || voice.name_contains("female") {
        (0.95, 1.05)
    } else if voice.name_contains("alex") || voice.name_contains("male") {
        (0.9, 0.85)
    } else {
        (base.rate, base.pitch)
    };

    Tuning { rate, pitch, ..base }
}

static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{1F300}-\x{1F9FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}\x{FE0F}\x{200D}]")
        .expect("valid regex")
});

static SPELLED_ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(AI|API|URL|HTML|CSS)\b").expect("valid regex"));

static JS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bJS\b").expect("valid regex"));

static OH_WOW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)oh wow").expect("valid regex"));

/// Clean reply text so it reads naturally when spoken
#[must_use]
pub fn prepare_text(text: &str) -> String {
    let text = EMOJI.replace_all(text, "");
    let text = SPELLED_ACRONYM.replace_all(&text, |caps: &regex::Captures<'_>| {
        let letters: Vec<String> = caps[1].chars().map(String::from).collect();
        letters.join(" ")
    });
    let text = JS.replace_all(&text, "JavaScript");
    let text = OH_WOW.replace_all(&text, "Oh, wow");
    text.trim().to_string()
}

/// Everything a synthesizer needs to speak one reply
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<Voice>,
    pub tuning: Tuning,
}

impl Utterance {
    /// Prepare `text` for the best voice among `voices`
    #[must_use]
    pub fn prepare(text: &str, voices: &[Voice], preference: &VoicePreference) -> Self {
        let voice = select_voice(voices, preference).cloned();
        tracing::debug!(
            voice = voice.as_ref().map_or("default voice", |v| v.name.as_str()),
            "selected voice"
        );
        Self {
            text: prepare_text(text),
            tuning: tuning_for(voice.as_ref()),
            voice,
        }
    }
}

/// A local speech engine
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Voices the engine can speak with
    async fn voices(&self) -> Result<Vec<Voice>>;

    /// Speak an utterance, resolving once playback has finished
    ///
    /// Any speech already playing is cancelled first.
    async fn speak(&self, utterance: &Utterance) -> Result<()>;

    /// Stop whatever is currently being spoken
    fn cancel(&self);
}
