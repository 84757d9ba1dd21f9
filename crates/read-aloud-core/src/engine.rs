//! Speech engine seam.
//!
//! The controller is the only caller of a [`SpeechEngine`]. Engines report
//! progress asynchronously by sending [`EngineEvent`]s over a channel; every
//! utterance event carries the [`UtteranceId`] the controller assigned when it
//! issued the request, so stale callbacks can be told apart from live ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc;
use ts_rs::TS;

/// Monotonically increasing tag assigned to each issued utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters captured at the moment an utterance is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceRequest {
    pub id: UtteranceId,
    pub index: usize,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// `None` means the engine's default voice.
    pub voice_id: Option<String>,
}

/// Failure reasons an engine can report, after the Web Speech error codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum UtteranceErrorKind {
    /// The utterance was removed by `cancel()`. Never a failure.
    Canceled,
    Interrupted,
    AudioBusy,
    AudioHardware,
    Network,
    SynthesisUnavailable,
    SynthesisFailed,
    LanguageUnavailable,
    VoiceUnavailable,
    TextTooLong,
    InvalidArgument,
    NotAllowed,
    Other(String),
}

impl UtteranceErrorKind {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Map a Web Speech `SpeechSynthesisErrorEvent.error` code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "canceled" => Self::Canceled,
            "interrupted" => Self::Interrupted,
            "audio-busy" => Self::AudioBusy,
            "audio-hardware" => Self::AudioHardware,
            "network" => Self::Network,
            "synthesis-unavailable" => Self::SynthesisUnavailable,
            "synthesis-failed" => Self::SynthesisFailed,
            "language-unavailable" => Self::LanguageUnavailable,
            "voice-unavailable" => Self::VoiceUnavailable,
            "text-too-long" => Self::TextTooLong,
            "invalid-argument" => Self::InvalidArgument,
            "not-allowed" => Self::NotAllowed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for UtteranceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Canceled => "canceled",
            Self::Interrupted => "interrupted",
            Self::AudioBusy => "audio-busy",
            Self::AudioHardware => "audio-hardware",
            Self::Network => "network",
            Self::SynthesisUnavailable => "synthesis-unavailable",
            Self::SynthesisFailed => "synthesis-failed",
            Self::LanguageUnavailable => "language-unavailable",
            Self::VoiceUnavailable => "voice-unavailable",
            Self::TextTooLong => "text-too-long",
            Self::InvalidArgument => "invalid-argument",
            Self::NotAllowed => "not-allowed",
            Self::Other(code) => code.as_str(),
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    Started,
    Finished,
    Failed(UtteranceErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Utterance { id: UtteranceId, event: UtteranceEvent },
    /// The voice list changed (it may populate after start-up).
    VoicesChanged,
}

pub type EngineEventSender = mpsc::Sender<EngineEvent>;
pub type EngineEventReceiver = mpsc::Receiver<EngineEvent>;

pub fn event_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::channel()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub locale: String,
}

/// A single-channel speech synthesizer.
///
/// Only one utterance may be active at a time; callers must `cancel()` before
/// issuing a new `speak()`. `cancel()` must report
/// [`UtteranceErrorKind::Canceled`] for the utterance it removed and also
/// clears any paused state.
pub trait SpeechEngine {
    fn is_available(&self) -> bool {
        true
    }

    /// Queue one utterance. A synchronous refusal is reported as the error
    /// kind the utterance would have failed with.
    fn speak(&mut self, request: UtteranceRequest) -> Result<(), UtteranceErrorKind>;

    fn cancel(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Whether an utterance is currently active (including while paused).
    fn is_speaking(&self) -> bool;

    fn list_voices(&self) -> Vec<Voice>;
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn speak(&mut self, request: UtteranceRequest) -> Result<(), UtteranceErrorKind> {
        (**self).speak(request)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn is_speaking(&self) -> bool {
        (**self).is_speaking()
    }

    fn list_voices(&self) -> Vec<Voice> {
        (**self).list_voices()
    }
}
