//! Keyboard shortcuts for the transport controls.
//!
//! Bindings come from the `[shortcuts]` table as strings like `"space"` or
//! `"shift+left"`.

use crate::config::AppConfig;
use crate::controller::PlaybackCommand;
use crate::playback::{PlaybackState, PlaybackStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: &str, modifiers: Modifiers) -> Self {
        Self {
            key: canonical_key(&normalize_shortcut_token(key, "")).to_string(),
            modifiers,
        }
    }

    /// Parse a chord written the same way bindings are, e.g. `"shift+right"`.
    pub fn parse(chord: &str) -> Option<Self> {
        let normalized = normalize_shortcut_token(chord, "");
        let mut modifiers = Modifiers::default();
        let mut key = None;
        for token in normalized
            .split('+')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            match token {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" => modifiers.alt = true,
                "logo" | "meta" | "super" | "cmd" | "command" => modifiers.logo = true,
                "shift" => modifiers.shift = true,
                other => key = Some(canonical_key(other).to_string()),
            }
        }
        key.map(|key| Self { key, modifiers })
    }
}

pub fn shortcut_matches(raw: &str, fallback: &str, pressed: &KeyPress) -> bool {
    let normalized = normalize_shortcut_token(raw, fallback);
    let Some(required) = KeyPress::parse(&normalized) else {
        return false;
    };
    required == *pressed
}

pub fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        fallback.to_string()
    } else {
        normalized.replace("spacebar", "space")
    }
}

/// Browser-style key names map onto the short names bindings use.
fn canonical_key(token: &str) -> &str {
    match token {
        "esc" => "escape",
        "arrowleft" => "left",
        "arrowright" => "right",
        "arrowup" => "up",
        "arrowdown" => "down",
        " " => "space",
        other => other,
    }
}

/// Map a key press to a transport command. Keys only act once there is
/// something to act on: toggle and navigation need an active session or a
/// placed cursor, stop needs an active session.
pub fn command_for_key(
    config: &AppConfig,
    pressed: &KeyPress,
    state: &PlaybackState,
) -> Option<PlaybackCommand> {
    if state.is_empty() {
        return None;
    }
    let active = state.status() != PlaybackStatus::Idle;
    let engaged = active || state.cursor().is_some();

    if shortcut_matches(&config.key_toggle_play_pause, "space", pressed) {
        engaged.then_some(PlaybackCommand::TogglePlayPause)
    } else if shortcut_matches(&config.key_stop, "escape", pressed) {
        active.then_some(PlaybackCommand::Stop)
    } else if shortcut_matches(&config.key_prev_paragraph, "shift+left", pressed) {
        engaged.then_some(PlaybackCommand::ParagraphBack)
    } else if shortcut_matches(&config.key_next_paragraph, "shift+right", pressed) {
        engaged.then_some(PlaybackCommand::ParagraphForward)
    } else if shortcut_matches(&config.key_prev_sentence, "left", pressed) {
        engaged.then_some(PlaybackCommand::SkipBack)
    } else if shortcut_matches(&config.key_next_sentence, "right", pressed) {
        engaged.then_some(PlaybackCommand::SkipForward)
    } else {
        None
    }
}
