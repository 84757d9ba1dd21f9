//! Owner of one read-aloud session: the playback state, the speech engine,
//! and the observers that re-render after every transition.

use crate::config::{AppConfig, WidgetPosition};
use crate::engine::{EngineEvent, SpeechEngine, UtteranceErrorKind, UtteranceEvent};
use crate::error::{ReadAloudError, Result};
use crate::playback::{
    EngineAction, PlaybackInput, PlaybackState, PlaybackStatus, VoiceParams, transition,
};
use crate::sentence::{SentenceUnit, SourceRef};
use crate::stats;
use crate::voices::{VoiceCatalog, VoiceView};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::mpsc;
use tracing::{debug, info, warn};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    GetSnapshot,
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    SkipForward,
    SkipBack,
    ParagraphForward,
    ParagraphBack,
    Seek { index: usize },
    SeekFraction { fraction: f64 },
    SetRate { rate: f32 },
    SetPitch { pitch: f32 },
    SetVolume { volume: f32 },
    SetVoice { voice_id: String },
}

impl PlaybackCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "playback_get_snapshot",
            Self::Play => "playback_play",
            Self::Pause => "playback_pause",
            Self::Stop => "playback_stop",
            Self::TogglePlayPause => "playback_toggle_play_pause",
            Self::SkipForward => "playback_skip_forward",
            Self::SkipBack => "playback_skip_back",
            Self::ParagraphForward => "playback_paragraph_forward",
            Self::ParagraphBack => "playback_paragraph_back",
            Self::Seek { .. } => "playback_seek",
            Self::SeekFraction { .. } => "playback_seek_fraction",
            Self::SetRate { .. } => "playback_set_rate",
            Self::SetPitch { .. } => "playback_set_pitch",
            Self::SetVolume { .. } => "playback_set_volume",
            Self::SetVoice { .. } => "playback_set_voice",
        }
    }
}

pub const ACTION_ENGINE_EVENT: &str = "playback_engine_event";
pub const ACTION_VOICES_CHANGED: &str = "playback_voices_changed";
pub const ACTION_SENTENCES_REPLACED: &str = "playback_sentences_replaced";

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SpeedPresetView {
    pub rate: f32,
    pub active: bool,
}

/// Read-only view handed to the presentation layer after every change.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub cursor: Option<usize>,
    pub sentence_count: usize,
    pub current_text: Option<String>,
    pub highlighted: Option<SourceRef>,
    pub progress_pct: u32,
    pub remaining_minutes: u32,
    pub status_line: String,
    pub banner_meta: String,
    pub last_error: Option<String>,
    pub voice: VoiceParams,
    pub speed_presets: Vec<SpeedPresetView>,
    pub voices: Vec<VoiceView>,
    pub position: WidgetPosition,
}

#[derive(Debug, Clone)]
pub struct PlaybackEvent {
    pub action: &'static str,
    pub snapshot: PlaybackSnapshot,
}

pub struct PlaybackController<E: SpeechEngine> {
    engine: E,
    state: PlaybackState,
    voices: VoiceCatalog,
    preferred_voice: String,
    speed_presets: Vec<f32>,
    words_per_minute: f32,
    position: WidgetPosition,
    subscribers: Vec<mpsc::Sender<PlaybackEvent>>,
}

impl<E: SpeechEngine> PlaybackController<E> {
    /// Build a session over `sentences`. Fails when there is nothing to
    /// read or nothing to read it with; in both cases no widget should be
    /// shown.
    pub fn new(engine: E, sentences: Vec<SentenceUnit>, config: &AppConfig) -> Result<Self> {
        if !engine.is_available() {
            let err = ReadAloudError::SpeechUnavailable("engine reported unavailable".to_string());
            warn!("{err}");
            return Err(err);
        }
        if sentences.is_empty() {
            let err = ReadAloudError::NoContentFound;
            warn!("{err}");
            return Err(err);
        }

        info!(
            sentences = sentences.len(),
            rate = config.default_rate,
            "Read-aloud session ready"
        );
        let mut controller = Self {
            engine,
            state: PlaybackState::new(sentences, VoiceParams::from_config(config)),
            voices: VoiceCatalog::from_config(config),
            preferred_voice: config.preferred_voice.trim().to_string(),
            speed_presets: config.speed_presets.clone(),
            words_per_minute: config.words_per_minute,
            position: config.position,
            subscribers: Vec::new(),
        };
        controller.refresh_voices();
        Ok(controller)
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.state.cursor()
    }

    pub fn speed_presets(&self) -> &[f32] {
        &self.speed_presets
    }

    /// Register an observer. Every change is delivered until the receiver
    /// is dropped.
    pub fn subscribe(&mut self) -> mpsc::Receiver<PlaybackEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn play(&mut self) {
        self.step(PlaybackInput::Play, "playback_play");
    }

    pub fn pause(&mut self) {
        self.step(PlaybackInput::Pause, "playback_pause");
    }

    pub fn stop(&mut self) {
        self.step(PlaybackInput::Stop, "playback_stop");
    }

    pub fn toggle_play_pause(&mut self) {
        self.step(PlaybackInput::TogglePlayPause, "playback_toggle_play_pause");
    }

    pub fn skip_forward(&mut self) {
        self.step(PlaybackInput::SkipForward, "playback_skip_forward");
    }

    pub fn skip_back(&mut self) {
        self.step(PlaybackInput::SkipBack, "playback_skip_back");
    }

    pub fn paragraph_forward(&mut self) {
        self.step(PlaybackInput::ParagraphForward, "playback_paragraph_forward");
    }

    pub fn paragraph_back(&mut self) {
        self.step(PlaybackInput::ParagraphBack, "playback_paragraph_back");
    }

    pub fn seek(&mut self, index: usize) {
        self.step(PlaybackInput::Seek { index }, "playback_seek");
    }

    /// Progress-bar click at `fraction` of the bar's width.
    pub fn seek_fraction(&mut self, fraction: f64) {
        self.step(
            PlaybackInput::SeekFraction { fraction },
            "playback_seek_fraction",
        );
    }

    /// Takes effect from the next issued sentence; the one in flight keeps
    /// the rate it was issued with.
    pub fn set_rate(&mut self, rate: f32) {
        if self.state.set_rate(rate) {
            info!(rate = self.state.voice_params().rate, "Speech rate changed");
            self.notify("playback_set_rate");
        } else {
            debug!(rate, "Ignoring invalid speech rate");
        }
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        if self.state.set_pitch(pitch) {
            info!(pitch = self.state.voice_params().pitch, "Speech pitch changed");
            self.notify("playback_set_pitch");
        } else {
            debug!(pitch, "Ignoring invalid speech pitch");
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        if self.state.set_volume(volume) {
            info!(volume = self.state.voice_params().volume, "Speech volume changed");
            self.notify("playback_set_volume");
        } else {
            debug!(volume, "Ignoring invalid speech volume");
        }
    }

    pub fn set_voice(&mut self, voice_id: &str) {
        self.state.set_voice(voice_id);
        let voice_id = self.state.voice_params().voice_id.as_str();
        if voice_id.is_empty() || self.voices.contains(voice_id) {
            info!(voice = voice_id, "Voice changed");
        } else {
            warn!(voice = voice_id, "Unknown voice; the engine default will be used");
        }
        self.notify("playback_set_voice");
    }

    /// Feed one engine callback through the state machine. Returns the
    /// failure to surface when the callback ended the session.
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Option<ReadAloudError> {
        match event {
            EngineEvent::Utterance { id, event } => {
                self.step(PlaybackInput::Utterance { id, event }, ACTION_ENGINE_EVENT)
            }
            EngineEvent::VoicesChanged => {
                self.refresh_voices();
                self.notify(ACTION_VOICES_CHANGED);
                None
            }
        }
    }

    /// Background keep-alive tick: some engines stall when their host is
    /// hidden, and a resume while speaking gets them going again. Never
    /// touches the playback state.
    pub fn keep_alive_nudge(&mut self) -> bool {
        if self.state.status() == PlaybackStatus::Playing && self.engine.is_speaking() {
            debug!("Keep-alive resume");
            self.engine.resume();
            return true;
        }
        false
    }

    /// Swap in a freshly segmented article. Anything playing is cancelled
    /// and the session starts over from Idle.
    pub fn replace_sentences(&mut self, sentences: Vec<SentenceUnit>) -> Result<()> {
        if sentences.is_empty() {
            let err = ReadAloudError::NoContentFound;
            warn!("{err}");
            return Err(err);
        }
        if self.state.in_flight().is_some() {
            self.engine.cancel();
        }
        info!(sentences = sentences.len(), "Sentence list replaced");
        self.state.replace_sentences(sentences);
        self.notify(ACTION_SENTENCES_REPLACED);
        Ok(())
    }

    pub fn apply_command(&mut self, command: PlaybackCommand) -> PlaybackEvent {
        let action = command.action();
        match command {
            PlaybackCommand::GetSnapshot => {}
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Stop => self.stop(),
            PlaybackCommand::TogglePlayPause => self.toggle_play_pause(),
            PlaybackCommand::SkipForward => self.skip_forward(),
            PlaybackCommand::SkipBack => self.skip_back(),
            PlaybackCommand::ParagraphForward => self.paragraph_forward(),
            PlaybackCommand::ParagraphBack => self.paragraph_back(),
            PlaybackCommand::Seek { index } => self.seek(index),
            PlaybackCommand::SeekFraction { fraction } => self.seek_fraction(fraction),
            PlaybackCommand::SetRate { rate } => self.set_rate(rate),
            PlaybackCommand::SetPitch { pitch } => self.set_pitch(pitch),
            PlaybackCommand::SetVolume { volume } => self.set_volume(volume),
            PlaybackCommand::SetVoice { voice_id } => self.set_voice(&voice_id),
        }
        PlaybackEvent {
            action,
            snapshot: self.snapshot(),
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let state = &self.state;
        let params = state.voice_params();
        let cursor = state.cursor();
        let current = cursor.and_then(|index| state.sentences().get(index));
        let remaining_minutes = stats::remaining_minutes(
            state.sentences(),
            cursor,
            params.rate,
            self.words_per_minute,
        );

        PlaybackSnapshot {
            status: state.status(),
            cursor,
            sentence_count: state.len(),
            current_text: current.map(|sentence| sentence.text.clone()),
            highlighted: current.and_then(|sentence| sentence.source_ref.clone()),
            progress_pct: stats::progress_pct(cursor, state.len()),
            remaining_minutes,
            status_line: stats::status_line(
                state.status(),
                params.rate,
                cursor,
                state.len(),
                remaining_minutes,
            ),
            banner_meta: stats::banner_meta(state.sentences(), params.rate, self.words_per_minute),
            last_error: state.last_failure().map(ToString::to_string),
            voice: params.clone(),
            speed_presets: self
                .speed_presets
                .iter()
                .map(|preset| SpeedPresetView {
                    rate: *preset,
                    active: (*preset - params.rate).abs() < 1e-4,
                })
                .collect(),
            voices: self.voices.views(&params.voice_id),
            position: self.position,
        }
    }

    fn step(&mut self, input: PlaybackInput, action: &'static str) -> Option<ReadAloudError> {
        let outcome = transition(&mut self.state, input);
        let mut changed = outcome.changed;
        let mut failure = outcome.failure;
        let mut pending: VecDeque<EngineAction> = outcome.actions.into();

        while let Some(engine_action) = pending.pop_front() {
            match engine_action {
                EngineAction::Cancel => self.engine.cancel(),
                EngineAction::Pause => self.engine.pause(),
                EngineAction::Resume => self.engine.resume(),
                EngineAction::Speak(mut request) => {
                    if let Some(voice) = request.voice_id.as_deref() {
                        if !self.voices.contains(voice) {
                            debug!(voice, "Voice not offered by engine; using default");
                            request.voice_id = None;
                        }
                    }
                    let id = request.id;
                    let index = request.index;
                    debug!(utterance = %id, index, rate = request.rate, "Speaking sentence");
                    if let Err(kind) = self.engine.speak(request) {
                        // A refused request is the same outcome as one that
                        // failed on start. Refusals are never cancellations.
                        let kind = if kind.is_cancellation() {
                            UtteranceErrorKind::Interrupted
                        } else {
                            kind
                        };
                        warn!(utterance = %id, index, %kind, "Engine refused utterance");
                        let followup = transition(
                            &mut self.state,
                            PlaybackInput::Utterance {
                                id,
                                event: UtteranceEvent::Failed(kind),
                            },
                        );
                        changed |= followup.changed;
                        failure = failure.or(followup.failure);
                        pending.extend(followup.actions);
                    }
                }
            }
        }

        if changed {
            self.notify(action);
        }
        failure
    }

    fn refresh_voices(&mut self) {
        self.voices.refresh(self.engine.list_voices());
        if self.voices.voices().is_empty() {
            return;
        }
        let current = self.state.voice_params().voice_id.clone();
        let wanted = if current.is_empty() {
            self.preferred_voice.as_str()
        } else {
            current.as_str()
        };
        let selected = self.voices.resolve_selection(wanted);
        if selected != current {
            debug!(voice = %selected, "Selected voice");
        }
        self.state.set_voice(&selected);
    }

    fn notify(&mut self, action: &'static str) {
        if self.subscribers.is_empty() {
            return;
        }
        let event = PlaybackEvent {
            action,
            snapshot: self.snapshot(),
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{Call, FakeEngine};
    use crate::engine::{UtteranceId, Voice};
    use crate::sentence::units_from_paragraphs;

    fn controller_with(engine: FakeEngine) -> PlaybackController<FakeEngine> {
        PlaybackController::new(
            engine,
            units_from_paragraphs([vec!["A.", "B."], vec!["C."]]),
            &AppConfig::default(),
        )
        .unwrap()
    }

    fn controller() -> (PlaybackController<FakeEngine>, FakeEngine) {
        let engine = FakeEngine::default();
        (controller_with(engine.clone()), engine)
    }

    fn finish(controller: &mut PlaybackController<FakeEngine>, id: UtteranceId) {
        let _ = controller.handle_engine_event(EngineEvent::Utterance {
            id,
            event: UtteranceEvent::Finished,
        });
    }

    fn finish_current(controller: &mut PlaybackController<FakeEngine>, engine: &FakeEngine) {
        let id = engine.last_spoken().id;
        controller.handle_engine_event(EngineEvent::Utterance {
            id,
            event: UtteranceEvent::Started,
        });
        finish(controller, id);
    }

    #[test]
    fn empty_article_is_no_content() {
        let result = PlaybackController::new(
            FakeEngine::default(),
            Vec::new(),
            &AppConfig::default(),
        );
        assert_eq!(result.err(), Some(ReadAloudError::NoContentFound));
    }

    #[test]
    fn unavailable_engine_is_reported() {
        let engine = FakeEngine {
            unavailable: true,
            ..FakeEngine::default()
        };
        let result = PlaybackController::new(
            engine,
            units_from_paragraphs([vec!["A."]]),
            &AppConfig::default(),
        );
        assert!(matches!(
            result.err(),
            Some(ReadAloudError::SpeechUnavailable(_))
        ));
    }

    #[test]
    fn plays_through_article_then_goes_idle() {
        let (mut controller, engine) = controller();
        controller.play();
        let mut seen = Vec::new();
        while controller.status() == PlaybackStatus::Playing {
            seen.push(controller.cursor().unwrap());
            finish_current(&mut controller, &engine);
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.cursor(), None);
        let texts: Vec<_> = engine.spoken().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["A.", "B.", "C."]);
        assert_eq!(engine.count(&Call::Cancel), 0);
    }

    #[test]
    fn pause_then_play_resumes_without_reissuing() {
        let (mut controller, engine) = controller();
        controller.play();
        finish_current(&mut controller, &engine);
        controller.pause();
        controller.play();
        assert_eq!(controller.cursor(), Some(1));
        assert_eq!(engine.spoken().len(), 2);
        assert_eq!(engine.count(&Call::Resume), 1);
        assert_eq!(controller.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn stop_cancels_exactly_once() {
        let (mut controller, engine) = controller();
        controller.stop();
        assert_eq!(engine.count(&Call::Cancel), 0);

        controller.play();
        controller.pause();
        controller.stop();
        assert_eq!(engine.count(&Call::Cancel), 1);
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.cursor(), None);
        assert!(controller.snapshot().highlighted.is_none());
    }

    #[test]
    fn skips_clamp_at_both_ends() {
        let (mut controller, engine) = controller();
        controller.play();
        controller.skip_back();
        assert_eq!(controller.cursor(), Some(0));
        controller.seek(2);
        controller.skip_forward();
        assert_eq!(controller.cursor(), Some(2));
        assert_eq!(engine.last_spoken().index, 2);
    }

    #[test]
    fn paragraph_back_from_last_paragraph_falls_back_to_start() {
        let (mut controller, engine) = controller();
        controller.play();
        finish_current(&mut controller, &engine);
        finish_current(&mut controller, &engine);
        assert_eq!(controller.cursor(), Some(2));
        engine.clear_calls();

        controller.paragraph_back();
        assert_eq!(engine.calls()[0], Call::Cancel);
        assert_eq!(engine.last_spoken().index, 0);
        assert_eq!(controller.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn paragraph_forward_lands_on_next_paragraph() {
        let (mut controller, engine) = controller();
        controller.play();
        controller.paragraph_forward();
        assert_eq!(engine.last_spoken().index, 2);
        controller.paragraph_forward();
        assert_eq!(engine.last_spoken().index, 2);
    }

    #[test]
    fn stale_finish_after_skip_is_ignored() {
        let (mut controller, engine) = controller();
        controller.play();
        let first = engine.last_spoken().id;
        controller.skip_forward();
        finish(&mut controller, first);
        assert_eq!(controller.cursor(), Some(1));
        assert_eq!(engine.spoken().len(), 2);
    }

    #[test]
    fn rate_change_applies_from_next_sentence() {
        let (mut controller, engine) = controller();
        controller.play();
        finish_current(&mut controller, &engine);
        assert_eq!(controller.cursor(), Some(1));

        controller.set_rate(1.25);
        assert_eq!(engine.spoken().len(), 2);
        assert!((engine.spoken()[1].rate - 1.0).abs() < f32::EPSILON);

        finish_current(&mut controller, &engine);
        let third = engine.last_spoken();
        assert_eq!(third.index, 2);
        assert!((third.rate - 1.25).abs() < f32::EPSILON);
    }

    #[test]
    fn refused_speak_goes_idle_with_error() {
        let (mut controller, engine) = controller();
        *engine.refuse_next.borrow_mut() = Some(UtteranceErrorKind::AudioBusy);
        controller.play();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.cursor(), Some(0));
        let snapshot = controller.snapshot();
        assert!(snapshot.last_error.unwrap().contains("audio-busy"));
    }

    #[test]
    fn unknown_voice_falls_back_to_engine_default() {
        let (mut controller, engine) = controller();
        controller.set_voice("nobody");
        controller.play();
        assert_eq!(engine.last_spoken().voice_id, None);
    }

    #[test]
    fn voices_changed_selects_preferred_default() {
        let (mut controller, engine) = controller();
        engine.voices.borrow_mut().extend([
            Voice {
                id: "alex".into(),
                name: "Alex".into(),
                locale: "en-US".into(),
            },
            Voice {
                id: "ava".into(),
                name: "Ava (Enhanced)".into(),
                locale: "en-US".into(),
            },
        ]);
        controller.handle_engine_event(EngineEvent::VoicesChanged);
        assert_eq!(controller.state().voice_params().voice_id, "ava");

        controller.play();
        assert_eq!(engine.last_spoken().voice_id.as_deref(), Some("ava"));
    }

    #[test]
    fn keep_alive_only_nudges_while_speaking() {
        let (mut controller, engine) = controller();
        assert!(!controller.keep_alive_nudge());
        controller.play();
        assert!(controller.keep_alive_nudge());
        assert_eq!(engine.count(&Call::Resume), 1);
        assert_eq!(controller.cursor(), Some(0));
        assert_eq!(controller.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn subscribers_receive_every_change() {
        let (mut controller, _engine) = controller();
        let events = controller.subscribe();
        controller.play();
        controller.pause();
        controller.pause();
        let actions: Vec<_> = events.try_iter().map(|event| event.action).collect();
        assert_eq!(actions, vec!["playback_play", "playback_pause"]);
    }

    #[test]
    fn commands_return_named_snapshots() {
        let (mut controller, _engine) = controller();
        let event = controller.apply_command(PlaybackCommand::SeekFraction { fraction: 0.7 });
        assert_eq!(event.action, "playback_seek_fraction");
        assert_eq!(event.snapshot.cursor, Some(2));
        assert_eq!(event.snapshot.status, PlaybackStatus::Idle);
        assert_eq!(event.snapshot.progress_pct, 100);

        let event = controller.apply_command(PlaybackCommand::SetRate { rate: 1.2 });
        assert!(event.snapshot.status_line.starts_with("Ready · 1.2x · 3/3"));
        let active: Vec<_> = event
            .snapshot
            .speed_presets
            .iter()
            .filter(|preset| preset.active)
            .map(|preset| preset.rate)
            .collect();
        assert_eq!(active, vec![1.2]);
    }

    #[test]
    fn snapshot_serializes_for_presentation_layer() {
        let (mut controller, _engine) = controller();
        controller.play();
        let json = serde_json::to_value(controller.snapshot()).unwrap();
        assert_eq!(json["status"], "playing");
        assert_eq!(json["position"], "top");
        assert_eq!(json["cursor"], 0);
        assert_eq!(json["current_text"], "A.");
    }

    #[test]
    fn replacing_sentences_cancels_and_resets() {
        let (mut controller, engine) = controller();
        controller.play();
        controller
            .replace_sentences(units_from_paragraphs([vec!["X.", "Y."]]))
            .unwrap();
        assert_eq!(engine.count(&Call::Cancel), 1);
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.snapshot().sentence_count, 2);
        assert_eq!(
            controller.replace_sentences(Vec::new()),
            Err(ReadAloudError::NoContentFound)
        );
    }
}
