//! Core of the read-aloud widget: article segmentation, the sentence
//! playback state machine and the controller that drives a speech engine.

pub mod asset_cache;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod keepalive;
pub mod playback;
pub mod segmenter;
pub mod sentence;
pub mod shortcuts;
pub mod stats;
pub mod text_utils;
pub mod voices;

pub use controller::{PlaybackCommand, PlaybackController, PlaybackEvent, PlaybackSnapshot};
pub use engine::{EngineEvent, SpeechEngine, UtteranceErrorKind, UtteranceEvent, UtteranceId, Voice};
pub use error::{ReadAloudError, Result};
pub use playback::PlaybackStatus;
pub use segmenter::Segmenter;
pub use sentence::{SentenceUnit, SourceRef};
