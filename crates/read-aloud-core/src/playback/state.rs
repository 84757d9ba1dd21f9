use crate::config::{AppConfig, MAX_PITCH, MAX_VOLUME, MIN_PITCH, MIN_VOLUME, sanitize_rate};
use crate::engine::UtteranceId;
use crate::error::ReadAloudError;
use crate::sentence::{SentenceUnit, paragraph_boundaries};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl PlaybackStatus {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "Ready",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

/// Voice settings read at the moment each utterance is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoiceParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Empty means "engine default".
    pub voice_id: String,
}

impl VoiceParams {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            rate: sanitize_rate(config.default_rate),
            pitch: config.default_pitch.clamp(MIN_PITCH, MAX_PITCH),
            volume: config.default_volume.clamp(MIN_VOLUME, MAX_VOLUME),
            voice_id: config.preferred_voice.clone(),
        }
    }
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// The utterance the engine is currently working on, as far as the
/// controller knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub(crate) id: UtteranceId,
    pub(crate) index: usize,
}

/// Per-session playback model. Owned by one controller; every mutation goes
/// through [`super::transitions::transition`] or the voice setters below.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub(crate) sentences: Vec<SentenceUnit>,
    pub(crate) paragraph_boundaries: Vec<usize>,
    pub(crate) cursor: Option<usize>,
    pub(crate) status: PlaybackStatus,
    pub(crate) voice_params: VoiceParams,
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) last_issued: u64,
    pub(crate) last_failure: Option<ReadAloudError>,
}

impl PlaybackState {
    pub fn new(sentences: Vec<SentenceUnit>, voice_params: VoiceParams) -> Self {
        let paragraph_boundaries = paragraph_boundaries(&sentences);
        Self {
            sentences,
            paragraph_boundaries,
            cursor: None,
            status: PlaybackStatus::Idle,
            voice_params,
            in_flight: None,
            last_issued: 0,
            last_failure: None,
        }
    }

    pub fn sentences(&self) -> &[SentenceUnit] {
        &self.sentences
    }

    pub fn paragraph_boundaries(&self) -> &[usize] {
        &self.paragraph_boundaries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn voice_params(&self) -> &VoiceParams {
        &self.voice_params
    }

    pub fn last_failure(&self) -> Option<&ReadAloudError> {
        self.last_failure.as_ref()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub(crate) fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    /// Hand out the next utterance tag. Tags never repeat within a session,
    /// including across sentence-list replacement.
    pub(crate) fn issue_id(&mut self) -> UtteranceId {
        self.last_issued = self.last_issued.wrapping_add(1);
        UtteranceId(self.last_issued)
    }

    /// Replace the sentence list after a re-extraction. Playback position is
    /// reset; the caller is responsible for cancelling the engine first.
    pub(crate) fn replace_sentences(&mut self, sentences: Vec<SentenceUnit>) {
        self.paragraph_boundaries = paragraph_boundaries(&sentences);
        self.sentences = sentences;
        self.cursor = None;
        self.status = PlaybackStatus::Idle;
        self.in_flight = None;
        self.last_failure = None;
    }

    pub(crate) fn set_rate(&mut self, rate: f32) -> bool {
        if !(rate.is_finite() && rate > 0.0) {
            return false;
        }
        self.voice_params.rate = sanitize_rate(rate);
        true
    }

    pub(crate) fn set_pitch(&mut self, pitch: f32) -> bool {
        if !pitch.is_finite() {
            return false;
        }
        self.voice_params.pitch = pitch.clamp(MIN_PITCH, MAX_PITCH);
        true
    }

    pub(crate) fn set_volume(&mut self, volume: f32) -> bool {
        if !volume.is_finite() {
            return false;
        }
        self.voice_params.volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
        true
    }

    pub(crate) fn set_voice(&mut self, voice_id: &str) {
        self.voice_params.voice_id = voice_id.trim().to_string();
    }
}
