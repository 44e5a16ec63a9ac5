//! Two-state voice recorder
//!
//! ```text
//!  Idle ── start ──▶ Recording { stream, chunks }
//!   ▲                      │
//!   └──────── stop ────────┘  (releases the device, yields one clip)
//! ```

use crate::audio::AudioClip;
use crate::{Error, Result};

/// A source of recorded audio
pub trait Microphone {
    type Stream: CaptureStream;

    /// Acquire the device and start capturing
    ///
    /// # Errors
    ///
    /// Returns `Error::PermissionDenied` if access is refused, or
    /// `Error::Audio` if no usable device exists
    fn open(&self) -> Result<Self::Stream>;
}

/// An open capture session on a microphone
pub trait CaptureStream {
    /// MIME type of the assembled clip
    fn mime_type(&self) -> &str;

    /// Drain the data captured since the last call
    fn take_chunk(&mut self) -> Vec<u8>;

    /// Release the device and turn the joined chunks into clip bytes
    ///
    /// # Errors
    ///
    /// Returns error if the captured data cannot be encoded
    fn finish(self, data: Vec<u8>) -> Result<Vec<u8>>;
}

enum State<S> {
    Idle,
    Recording { stream: S, chunks: Vec<u8> },
}

/// Outcome of the single record control
#[derive(Debug)]
pub enum Toggle {
    Started,
    Stopped(AudioClip),
}

/// Records one clip at a time from a [`Microphone`]
pub struct Recorder<M: Microphone> {
    microphone: M,
    state: State<M::Stream>,
}

impl<M: Microphone> Recorder<M> {
    #[must_use]
    pub const fn new(microphone: M) -> Self {
        Self {
            microphone,
            state: State::Idle,
        }
    }

    /// Whether a capture is in progress
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    /// Open the microphone and start buffering
    ///
    /// Starting while already recording does nothing.
    ///
    /// # Errors
    ///
    /// Returns the microphone's error; the recorder stays idle
    pub fn start(&mut self) -> Result<()> {
        if self.is_recording() {
            return Ok(());
        }

        let stream = self.microphone.open()?;
        tracing::debug!(mime_type = stream.mime_type(), "recording started");
        self.state = State::Recording {
            stream,
            chunks: Vec::new(),
        };
        Ok(())
    }

    /// Move newly captured data into the buffer
    pub fn poll(&mut self) {
        if let State::Recording { stream, chunks } = &mut self.state {
            chunks.extend(stream.take_chunk());
        }
    }

    /// Stop capturing and assemble the clip
    ///
    /// # Errors
    ///
    /// Returns error if nothing is being recorded or encoding fails. The
    /// recorder is idle afterwards either way.
    pub fn stop(&mut self) -> Result<AudioClip> {
        let State::Recording {
            mut stream,
            mut chunks,
        } = std::mem::replace(&mut self.state, State::Idle)
        else {
            return Err(Error::Audio("not recording".to_string()));
        };

        chunks.extend(stream.take_chunk());
        let mime_type = stream.mime_type().to_string();
        let bytes = stream.finish(chunks)?;

        tracing::debug!(bytes = bytes.len(), %mime_type, "recording stopped");
        Ok(AudioClip::new(bytes, mime_type))
    }

    /// Start when idle, stop when recording
    ///
    /// # Errors
    ///
    /// Returns the error from [`Self::start`] or [`Self::stop`]
    pub fn toggle(&mut self) -> Result<Toggle> {
        if self.is_recording() {
            self.stop().map(Toggle::Stopped)
        } else {
            self.start().map(|()| Toggle::Started)
        }
    }
}

/// Object-safe view of a recorder, for front ends that may lack a microphone
pub trait VoiceInput {
    /// See [`Recorder::toggle`]
    ///
    /// # Errors
    ///
    /// Returns the recorder's start or stop error
    fn toggle(&mut self) -> Result<Toggle>;

    /// See [`Recorder::poll`]
    fn poll(&mut self);

    /// See [`Recorder::is_recording`]
    fn is_recording(&self) -> bool;
}

impl<M: Microphone> VoiceInput for Recorder<M> {
    fn toggle(&mut self) -> Result<Toggle> {
        Self::toggle(self)
    }

    fn poll(&mut self) {
        Self::poll(self);
    }

    fn is_recording(&self) -> bool {
        Self::is_recording(self)
    }
}
