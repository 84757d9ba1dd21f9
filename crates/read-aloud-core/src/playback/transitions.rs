use super::navigation::{Direction, fraction_to_index, nearest_paragraph_boundary, skip_target};
use super::state::{InFlight, PlaybackState, PlaybackStatus};
use crate::engine::{UtteranceEvent, UtteranceId, UtteranceRequest};
use crate::error::ReadAloudError;
use tracing::{debug, info, warn};

/// Everything that can move the playback state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackInput {
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
    Utterance { id: UtteranceId, event: UtteranceEvent },
}

/// Engine calls a transition asks for, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineAction {
    Speak(UtteranceRequest),
    Cancel,
    Pause,
    Resume,
}

#[derive(Debug, Default)]
pub struct Transition {
    pub actions: Vec<EngineAction>,
    /// Whether observers should re-render (cursor, status or highlight moved).
    pub changed: bool,
    pub failure: Option<ReadAloudError>,
}

impl Transition {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed(actions: Vec<EngineAction>) -> Self {
        Self {
            actions,
            changed: true,
            failure: None,
        }
    }
}

pub fn transition(state: &mut PlaybackState, input: PlaybackInput) -> Transition {
    match input {
        PlaybackInput::Play => on_play(state),
        PlaybackInput::Pause => on_pause(state),
        PlaybackInput::Stop => on_stop(state),
        PlaybackInput::TogglePlayPause => {
            if state.status == PlaybackStatus::Playing {
                on_pause(state)
            } else {
                on_play(state)
            }
        }
        PlaybackInput::SkipForward => {
            let target = skip_target(state.cursor, Direction::Forward, state.len());
            jump_to(state, target, "Skipping forward")
        }
        PlaybackInput::SkipBack => {
            let target = skip_target(state.cursor, Direction::Back, state.len());
            jump_to(state, target, "Skipping back")
        }
        PlaybackInput::ParagraphForward => {
            let target = nearest_paragraph_boundary(
                &state.paragraph_boundaries,
                state.len(),
                Direction::Forward,
                state.cursor,
            );
            jump_to(state, target, "Jumping to next paragraph")
        }
        PlaybackInput::ParagraphBack => {
            let target = nearest_paragraph_boundary(
                &state.paragraph_boundaries,
                state.len(),
                Direction::Back,
                state.cursor,
            );
            jump_to(state, target, "Jumping to previous paragraph")
        }
        PlaybackInput::Seek { index } => {
            if index >= state.len() {
                warn!(index, len = state.len(), "Ignoring out-of-range seek");
                return Transition::unchanged();
            }
            jump_to(state, Some(index), "Seeking")
        }
        PlaybackInput::SeekFraction { fraction } => {
            let target = fraction_to_index(fraction, state.len());
            jump_to(state, target, "Seeking from progress bar")
        }
        PlaybackInput::Utterance { id, event } => on_utterance(state, id, event),
    }
}

fn on_play(state: &mut PlaybackState) -> Transition {
    if state.is_empty() {
        debug!("Play requested with no sentences");
        return Transition::unchanged();
    }

    if state.status == PlaybackStatus::Paused && state.in_flight.is_some() {
        info!(cursor = ?state.cursor, "Resuming paused utterance");
        state.status = PlaybackStatus::Playing;
        return Transition::changed(vec![EngineAction::Resume]);
    }

    let start = state.cursor.unwrap_or(0).min(state.len() - 1);
    info!(start, "Starting playback");
    let mut actions = Vec::new();
    speak_at(state, start, &mut actions);
    Transition::changed(actions)
}

fn on_pause(state: &mut PlaybackState) -> Transition {
    if state.status != PlaybackStatus::Playing {
        debug!(status = ?state.status, "Pause ignored; not playing");
        return Transition::unchanged();
    }
    info!(cursor = ?state.cursor, "Pausing playback");
    state.status = PlaybackStatus::Paused;
    Transition::changed(vec![EngineAction::Pause])
}

fn on_stop(state: &mut PlaybackState) -> Transition {
    let mut actions = Vec::new();
    if let Some(in_flight) = state.in_flight.take() {
        debug!(utterance = %in_flight.id, "Cancelling in-flight utterance for stop");
        actions.push(EngineAction::Cancel);
    }
    info!("Stopping playback");
    state.status = PlaybackStatus::Idle;
    state.cursor = None;
    Transition::changed(actions)
}

/// Dual behaviour shared by skip, paragraph jump and seek: restart audio at
/// `target` when a session is active, otherwise only move the cursor.
fn jump_to(state: &mut PlaybackState, target: Option<usize>, reason: &'static str) -> Transition {
    let Some(target) = target else {
        debug!(reason, "Navigation ignored; no sentences");
        return Transition::unchanged();
    };

    if state.status == PlaybackStatus::Idle {
        debug!(reason, target, "Moving cursor without audio");
        state.cursor = Some(target);
        return Transition::changed(Vec::new());
    }

    info!(reason, target, from = ?state.cursor, "Restarting speech at target");
    let mut actions = Vec::new();
    speak_at(state, target, &mut actions);
    Transition::changed(actions)
}

/// Cancel whatever is in flight, then issue a freshly tagged utterance for
/// `index` using the voice parameters as they are right now.
fn speak_at(state: &mut PlaybackState, index: usize, actions: &mut Vec<EngineAction>) {
    if state.in_flight.take().is_some() {
        actions.push(EngineAction::Cancel);
    }

    let id = state.issue_id();
    let params = &state.voice_params;
    let request = UtteranceRequest {
        id,
        index,
        text: state.sentences[index].text.clone(),
        rate: params.rate,
        pitch: params.pitch,
        volume: params.volume,
        voice_id: Some(params.voice_id.clone()).filter(|voice| !voice.is_empty()),
    };

    state.in_flight = Some(InFlight { id, index });
    state.cursor = Some(index);
    state.status = PlaybackStatus::Playing;
    state.last_failure = None;
    actions.push(EngineAction::Speak(request));
}

fn on_utterance(state: &mut PlaybackState, id: UtteranceId, event: UtteranceEvent) -> Transition {
    let Some(in_flight) = state.in_flight.filter(|current| current.id == id) else {
        debug!(
            utterance = %id,
            current = ?state.in_flight.map(|current| current.id),
            ?event,
            "Ignoring stale utterance event"
        );
        return Transition::unchanged();
    };

    match event {
        UtteranceEvent::Started => {
            debug!(utterance = %id, index = in_flight.index, "Utterance started");
            state.cursor = Some(in_flight.index);
            Transition::changed(Vec::new())
        }
        UtteranceEvent::Finished => on_finished(state, in_flight),
        UtteranceEvent::Failed(kind) if kind.is_cancellation() => {
            // Cancels we issue clear `in_flight` first, so a matching one came
            // from outside the controller. Nothing to advance.
            debug!(utterance = %id, "Utterance cancelled outside the controller");
            Transition::unchanged()
        }
        UtteranceEvent::Failed(kind) => {
            warn!(utterance = %id, index = in_flight.index, %kind, "Utterance failed; stopping");
            state.in_flight = None;
            state.status = PlaybackStatus::Idle;
            let failure = ReadAloudError::UtteranceFailed {
                index: in_flight.index,
                kind,
            };
            state.last_failure = Some(failure.clone());
            Transition {
                actions: Vec::new(),
                changed: true,
                failure: Some(failure),
            }
        }
    }
}

fn on_finished(state: &mut PlaybackState, finished: InFlight) -> Transition {
    state.in_flight = None;
    let next = finished.index + 1;

    if next >= state.len() {
        info!(last = finished.index, "Reached end of article");
        state.status = PlaybackStatus::Idle;
        state.cursor = None;
        return Transition::changed(Vec::new());
    }

    if state.status == PlaybackStatus::Paused {
        // Audio drained just as the user paused: park on the next sentence so
        // play() starts it fresh.
        debug!(next, "Utterance finished while paused");
        state.cursor = Some(next);
        return Transition::changed(Vec::new());
    }

    let mut actions = Vec::new();
    speak_at(state, next, &mut actions);
    Transition::changed(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::UtteranceErrorKind;
    use crate::playback::state::VoiceParams;
    use crate::sentence::units_from_paragraphs;

    fn abc() -> PlaybackState {
        PlaybackState::new(
            units_from_paragraphs([vec!["A.", "B."], vec!["C."]]),
            VoiceParams::default(),
        )
    }

    fn spoken(transition: &Transition) -> Vec<&UtteranceRequest> {
        transition
            .actions
            .iter()
            .filter_map(|action| match action {
                EngineAction::Speak(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn current_id(state: &PlaybackState) -> UtteranceId {
        state.in_flight().expect("utterance in flight").id
    }

    #[test]
    fn play_from_idle_speaks_first_sentence() {
        let mut state = abc();
        let step = transition(&mut state, PlaybackInput::Play);
        assert_eq!(step.actions.len(), 1);
        assert_eq!(spoken(&step)[0].index, 0);
        assert_eq!(spoken(&step)[0].text, "A.");
        assert_eq!(state.status(), PlaybackStatus::Playing);
        assert_eq!(state.cursor(), Some(0));
    }

    #[test]
    fn play_with_no_sentences_is_a_no_op() {
        let mut state = PlaybackState::new(Vec::new(), VoiceParams::default());
        let step = transition(&mut state, PlaybackInput::Play);
        assert!(step.actions.is_empty());
        assert!(!step.changed);
        assert_eq!(state.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn finishing_chains_to_next_sentence() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::Play);
        let id = current_id(&state);
        let step = transition(
            &mut state,
            PlaybackInput::Utterance {
                id,
                event: UtteranceEvent::Finished,
            },
        );
        assert_eq!(spoken(&step)[0].index, 1);
        assert!(!step.actions.contains(&EngineAction::Cancel));
        assert_eq!(state.cursor(), Some(1));
    }

    #[test]
    fn pause_does_not_touch_cursor() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::Seek { index: 1 });
        transition(&mut state, PlaybackInput::Play);
        let step = transition(&mut state, PlaybackInput::Pause);
        assert_eq!(step.actions, vec![EngineAction::Pause]);
        assert_eq!(state.status(), PlaybackStatus::Paused);
        assert_eq!(state.cursor(), Some(1));
    }

    #[test]
    fn pause_when_idle_is_ignored() {
        let mut state = abc();
        let step = transition(&mut state, PlaybackInput::Pause);
        assert!(step.actions.is_empty());
        assert_eq!(state.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn toggle_alternates_pause_and_resume() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::TogglePlayPause);
        assert_eq!(state.status(), PlaybackStatus::Playing);
        transition(&mut state, PlaybackInput::TogglePlayPause);
        assert_eq!(state.status(), PlaybackStatus::Paused);
        let step = transition(&mut state, PlaybackInput::TogglePlayPause);
        assert_eq!(step.actions, vec![EngineAction::Resume]);
    }

    #[test]
    fn skip_while_paused_cancels_and_plays_target() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::Play);
        transition(&mut state, PlaybackInput::Pause);
        let step = transition(&mut state, PlaybackInput::SkipForward);
        assert_eq!(step.actions[0], EngineAction::Cancel);
        assert_eq!(spoken(&step)[0].index, 1);
        assert_eq!(state.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn cancellation_error_for_seek_keeps_playing() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::Play);
        let old = current_id(&state);
        transition(&mut state, PlaybackInput::SkipForward);
        let step = transition(
            &mut state,
            PlaybackInput::Utterance {
                id: old,
                event: UtteranceEvent::Failed(UtteranceErrorKind::Canceled),
            },
        );
        assert!(!step.changed);
        assert!(step.failure.is_none());
        assert_eq!(state.status(), PlaybackStatus::Playing);
        assert_eq!(state.cursor(), Some(1));
    }

    #[test]
    fn genuine_failure_goes_idle_and_keeps_cursor() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::Seek { index: 1 });
        transition(&mut state, PlaybackInput::Play);
        let id = current_id(&state);
        let step = transition(
            &mut state,
            PlaybackInput::Utterance {
                id,
                event: UtteranceEvent::Failed(UtteranceErrorKind::SynthesisFailed),
            },
        );
        assert_eq!(
            step.failure,
            Some(ReadAloudError::UtteranceFailed {
                index: 1,
                kind: UtteranceErrorKind::SynthesisFailed,
            })
        );
        assert!(step.actions.is_empty());
        assert_eq!(state.status(), PlaybackStatus::Idle);
        assert_eq!(state.cursor(), Some(1));
        assert!(state.last_failure().is_some());
    }

    #[test]
    fn stale_finish_never_advances() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::Play);
        let old = current_id(&state);
        transition(&mut state, PlaybackInput::Stop);
        let step = transition(
            &mut state,
            PlaybackInput::Utterance {
                id: old,
                event: UtteranceEvent::Finished,
            },
        );
        assert!(step.actions.is_empty());
        assert_eq!(state.status(), PlaybackStatus::Idle);
        assert_eq!(state.cursor(), None);
    }

    #[test]
    fn idle_navigation_moves_cursor_silently() {
        let mut state = abc();
        let step = transition(&mut state, PlaybackInput::ParagraphForward);
        assert!(step.actions.is_empty());
        assert!(step.changed);
        assert_eq!(state.cursor(), Some(2));
        assert_eq!(state.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn out_of_range_seek_is_ignored() {
        let mut state = abc();
        let step = transition(&mut state, PlaybackInput::Seek { index: 3 });
        assert!(!step.changed);
        assert_eq!(state.cursor(), None);
    }

    #[test]
    fn finish_while_paused_parks_on_next_sentence() {
        let mut state = abc();
        transition(&mut state, PlaybackInput::Play);
        let id = current_id(&state);
        transition(&mut state, PlaybackInput::Pause);
        let step = transition(
            &mut state,
            PlaybackInput::Utterance {
                id,
                event: UtteranceEvent::Finished,
            },
        );
        assert!(step.actions.is_empty());
        assert_eq!(state.status(), PlaybackStatus::Paused);
        assert_eq!(state.cursor(), Some(1));

        let resume = transition(&mut state, PlaybackInput::Play);
        assert_eq!(spoken(&resume)[0].index, 1);
    }
}
