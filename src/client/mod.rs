//! Chat client: relay access, conversation state, voice in and out

#[cfg(feature = "microphone")]
mod capture;
pub mod recorder;
pub mod relay;
pub mod session;
pub mod speech;
mod system_speech;
pub mod terminal;

#[cfg(feature = "microphone")]
pub use capture::CpalMicrophone;
pub use recorder::{CaptureStream, Microphone, Recorder, Toggle, VoiceInput};
pub use relay::{AudioReply, RelayApi, RelayClient};
pub use session::{ChatSession, Entry, EntryId, PendingReply, Reply, Sender, Transcript};
pub use speech::{
    SpeechSynthesizer, Tuning, Utterance, Voice, VoicePreference, menu_voices, prepare_text,
    select_voice, tuning_for,
};
pub use system_speech::{Backend, SystemSpeech};
pub use terminal::Terminal;
