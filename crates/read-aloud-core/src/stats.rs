//! Reading-time estimates and the status strings shown by the widget.
//!
//! All of these are display-only; nothing here feeds back into playback.

use crate::playback::PlaybackStatus;
use crate::sentence::SentenceUnit;
use crate::text_utils::word_count;

/// Words from `cursor` (inclusive) to the end. The whole article when
/// nothing has played yet.
pub fn words_remaining(sentences: &[SentenceUnit], cursor: Option<usize>) -> usize {
    let start = cursor.unwrap_or(0).min(sentences.len());
    sentences[start..]
        .iter()
        .map(|sentence| word_count(&sentence.text))
        .sum()
}

/// `ceil(words / (words_per_minute * rate))`, in whole minutes.
pub fn remaining_minutes(
    sentences: &[SentenceUnit],
    cursor: Option<usize>,
    rate: f32,
    words_per_minute: f32,
) -> u32 {
    let words = words_remaining(sentences, cursor) as f64;
    let pace = f64::from(words_per_minute) * f64::from(rate);
    if words == 0.0 || !(pace.is_finite() && pace > 0.0) {
        return 0;
    }
    (words / pace).ceil() as u32
}

/// Percentage of sentences reached, counting the current one.
pub fn progress_pct(cursor: Option<usize>, len: usize) -> u32 {
    match cursor {
        Some(index) if len > 0 => {
            let done = (index.min(len - 1) + 1) as f64;
            (done / len as f64 * 100.0).round() as u32
        }
        _ => 0,
    }
}

pub fn status_line(
    status: PlaybackStatus,
    rate: f32,
    cursor: Option<usize>,
    len: usize,
    remaining_minutes: u32,
) -> String {
    let mut line = format!("{} · {}x", status.label(), rate);
    if let Some(index) = cursor.filter(|index| *index < len) {
        line.push_str(&format!(" · {}/{}", index + 1, len));
    }
    line.push_str(&format!(" · ~{remaining_minutes} min left"));
    line
}

/// Banner summary: whole-article estimate at `rate`.
pub fn banner_meta(sentences: &[SentenceUnit], rate: f32, words_per_minute: f32) -> String {
    let minutes = remaining_minutes(sentences, None, rate, words_per_minute);
    format!("{} sentences · ~{} min read", sentences.len(), minutes)
}
