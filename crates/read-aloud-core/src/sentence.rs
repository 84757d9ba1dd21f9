use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque handle back to the block element a sentence was read from.
///
/// `ordinal` is the block's position among the text-bearing blocks of the
/// article, which is enough for a presentation layer to find and highlight
/// the element again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SourceRef {
    pub ordinal: usize,
    pub tag: String,
}

/// One speakable sentence. Immutable for the lifetime of a session; its
/// position in the sentence list is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SentenceUnit {
    pub text: String,
    pub source_ref: Option<SourceRef>,
    pub is_paragraph_start: bool,
}

impl SentenceUnit {
    pub fn new(text: impl Into<String>, source_ref: Option<SourceRef>, is_paragraph_start: bool) -> Self {
        Self {
            text: text.into(),
            source_ref,
            is_paragraph_start,
        }
    }
}

/// Indices of sentences that open a paragraph. The first sentence always
/// counts as a paragraph start so that back-navigation has a floor.
pub fn paragraph_boundaries(sentences: &[SentenceUnit]) -> Vec<usize> {
    sentences
        .iter()
        .enumerate()
        .filter(|(idx, sentence)| *idx == 0 || sentence.is_paragraph_start)
        .map(|(idx, _)| idx)
        .collect()
}

/// Build plain units from bare strings, one paragraph per entry of
/// `paragraphs`. Handy for hosts that already have segmented text.
pub fn units_from_paragraphs<P, S>(paragraphs: P) -> Vec<SentenceUnit>
where
    P: IntoIterator,
    P::Item: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut units = Vec::new();
    for paragraph in paragraphs {
        let mut first = true;
        for text in paragraph {
            let text: String = text.into();
            if text.trim().is_empty() {
                continue;
            }
            units.push(SentenceUnit::new(text, None, first));
            first = false;
        }
    }
    units
}
