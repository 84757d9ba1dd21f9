//! Sentence-sequencing state machine.
//!
//! [`state::PlaybackState`] is plain data; [`transitions::transition`] is the
//! only code that moves it, returning the engine calls to make instead of
//! making them. The controller executes those calls.

pub mod navigation;
pub mod state;
pub mod transitions;

pub use navigation::{Direction, clamp_index, fraction_to_index, nearest_paragraph_boundary};
pub use state::{PlaybackState, PlaybackStatus, VoiceParams};
pub use transitions::{EngineAction, PlaybackInput, Transition, transition};
