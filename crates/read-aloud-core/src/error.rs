use crate::engine::UtteranceErrorKind;
use thiserror::Error;

/// Errors surfaced to the host page / presentation layer.
///
/// Utterance cancellation never appears here: it is an expected,
/// internal outcome of seeking and is filtered out by
/// [`UtteranceErrorKind::is_cancellation`] before anything reaches here.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReadAloudError {
    #[error("no readable content found; set content.selector to target the article")]
    NoContentFound,
    #[error("speech synthesis unavailable: {0}")]
    SpeechUnavailable(String),
    #[error("sentence {index} could not be spoken ({kind})")]
    UtteranceFailed {
        index: usize,
        kind: UtteranceErrorKind,
    },
    #[error("asset cache error: {0}")]
    AssetCache(String),
}

impl ReadAloudError {
    /// Terminal errors prevent the widget from being presented at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoContentFound | Self::SpeechUnavailable(_))
    }
}

pub type Result<T, E = ReadAloudError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_startup_errors_are_terminal() {
        assert!(ReadAloudError::NoContentFound.is_terminal());
        assert!(ReadAloudError::SpeechUnavailable("missing".into()).is_terminal());
        let failed = ReadAloudError::UtteranceFailed {
            index: 3,
            kind: UtteranceErrorKind::SynthesisFailed,
        };
        assert!(!failed.is_terminal());
        assert_eq!(
            failed.to_string(),
            format!("sentence 3 could not be spoken ({})", UtteranceErrorKind::SynthesisFailed)
        );
    }
}
