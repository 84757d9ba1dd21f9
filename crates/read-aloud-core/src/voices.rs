//! Voice list filtering and default-voice selection.

use crate::config::AppConfig;
use crate::engine::Voice;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

static RE_VENDOR_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Microsoft |Google |Apple )").unwrap());

/// Voice entry as the voice picker shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct VoiceView {
    pub id: String,
    pub display_name: String,
    pub locale: String,
    pub selected: bool,
}

/// Name without the vendor prefix most platforms put in front of it.
pub fn display_name(name: &str) -> String {
    RE_VENDOR_PREFIX.replace(name, "").into_owned()
}

#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    locale_prefix: String,
    name_hints: Vec<String>,
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            locale_prefix: config.voice_locale_prefix.trim().to_ascii_lowercase(),
            name_hints: config.voice_name_hints.clone(),
            voices: Vec::new(),
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn contains(&self, voice_id: &str) -> bool {
        self.voices.iter().any(|voice| voice.id == voice_id)
    }

    /// Replace the list with `available`, keeping only voices for the
    /// configured locale when there are any.
    pub fn refresh(&mut self, available: Vec<Voice>) {
        let total = available.len();
        let prefix = self.locale_prefix.as_str();
        let matching: Vec<Voice> = available
            .iter()
            .filter(|voice| voice.locale.to_ascii_lowercase().starts_with(prefix))
            .cloned()
            .collect();

        self.voices = if matching.is_empty() {
            debug!(prefix, total, "No voices for locale; offering all");
            available
        } else {
            matching
        };
        info!(count = self.voices.len(), total, "Voice list refreshed");
    }

    /// Keep `current` when it is still offered, otherwise pick a default:
    /// the first voice whose name carries a quality hint, else the first.
    /// Empty when no voices are known.
    pub fn resolve_selection(&self, current: &str) -> String {
        if !current.is_empty() && self.contains(current) {
            return current.to_string();
        }
        let hinted = self.voices.iter().find(|voice| {
            self.name_hints
                .iter()
                .any(|hint| !hint.is_empty() && voice.name.contains(hint.as_str()))
        });
        hinted
            .or_else(|| self.voices.first())
            .map(|voice| voice.id.clone())
            .unwrap_or_default()
    }

    pub fn views(&self, selected: &str) -> Vec<VoiceView> {
        self.voices
            .iter()
            .map(|voice| VoiceView {
                id: voice.id.clone(),
                display_name: display_name(&voice.name),
                locale: voice.locale.clone(),
                selected: voice.id == selected,
            })
            .collect()
    }
}
