//! Text splitting helpers shared by the segmenter and the estimates.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());
static RE_BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Split after `.`, `!` or `?` when followed by whitespace. The terminator
/// stays with its sentence; empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;

    for found in RE_SENTENCE_END.find_iter(text) {
        // Terminators are ASCII, so `start + 1` is a char boundary.
        let end = found.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = found.end();
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

/// Fallback splitting for content without block structure: sentence ends and
/// blank lines both terminate a sentence.
pub fn split_sentences_and_blank_lines(text: &str) -> Vec<String> {
    RE_BLANK_LINE
        .split(text)
        .flat_map(split_sentences)
        .collect()
}

/// Collapse runs of whitespace into single spaces, trim, and NFC-normalize.
pub fn clean_text(raw: &str) -> String {
    let normalized: String = raw.nfc().collect();
    RE_WHITESPACE.replace_all(normalized.trim(), " ").into_owned()
}

/// Whitespace-delimited token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
