use serde::Deserialize;
use ts_rs::TS;

pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 10.0;
pub const MIN_PITCH: f32 = 0.5;
pub const MAX_PITCH: f32 = 1.5;
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 1.0;

/// High-level widget configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub content_selector: String,
    #[serde(default = "crate::config::defaults::default_block_selector")]
    pub block_selector: String,
    #[serde(default = "crate::config::defaults::default_min_article_chars")]
    pub min_article_chars: usize,
    #[serde(default = "crate::config::defaults::default_rate")]
    pub default_rate: f32,
    #[serde(default = "crate::config::defaults::default_pitch")]
    pub default_pitch: f32,
    #[serde(default = "crate::config::defaults::default_volume")]
    pub default_volume: f32,
    #[serde(default = "crate::config::defaults::default_speed_presets")]
    pub speed_presets: Vec<f32>,
    #[serde(default)]
    pub preferred_voice: String,
    #[serde(default = "crate::config::defaults::default_voice_locale_prefix")]
    pub voice_locale_prefix: String,
    #[serde(default = "crate::config::defaults::default_voice_name_hints")]
    pub voice_name_hints: Vec<String>,
    #[serde(default = "crate::config::defaults::default_words_per_minute")]
    pub words_per_minute: f32,
    #[serde(default)]
    pub position: WidgetPosition,
    #[serde(default = "crate::config::defaults::default_keep_alive_interval_secs")]
    pub keep_alive_interval_secs: u64,
    #[serde(default = "crate::config::defaults::default_key_toggle_play_pause")]
    pub key_toggle_play_pause: String,
    #[serde(default = "crate::config::defaults::default_key_stop")]
    pub key_stop: String,
    #[serde(default = "crate::config::defaults::default_key_prev_sentence")]
    pub key_prev_sentence: String,
    #[serde(default = "crate::config::defaults::default_key_next_sentence")]
    pub key_next_sentence: String,
    #[serde(default = "crate::config::defaults::default_key_prev_paragraph")]
    pub key_prev_paragraph: String,
    #[serde(default = "crate::config::defaults::default_key_next_paragraph")]
    pub key_next_paragraph: String,
    #[serde(default = "crate::config::defaults::default_cache_name")]
    pub cache_name: String,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default)]
    pub bypass_hosts: Vec<String>,
    #[serde(default)]
    pub manifest: Vec<String>,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            content_selector: String::new(),
            block_selector: crate::config::defaults::default_block_selector(),
            min_article_chars: crate::config::defaults::default_min_article_chars(),
            default_rate: crate::config::defaults::default_rate(),
            default_pitch: crate::config::defaults::default_pitch(),
            default_volume: crate::config::defaults::default_volume(),
            speed_presets: crate::config::defaults::default_speed_presets(),
            preferred_voice: String::new(),
            voice_locale_prefix: crate::config::defaults::default_voice_locale_prefix(),
            voice_name_hints: crate::config::defaults::default_voice_name_hints(),
            words_per_minute: crate::config::defaults::default_words_per_minute(),
            position: WidgetPosition::Top,
            keep_alive_interval_secs: crate::config::defaults::default_keep_alive_interval_secs(),
            key_toggle_play_pause: crate::config::defaults::default_key_toggle_play_pause(),
            key_stop: crate::config::defaults::default_key_stop(),
            key_prev_sentence: crate::config::defaults::default_key_prev_sentence(),
            key_next_sentence: crate::config::defaults::default_key_next_sentence(),
            key_prev_paragraph: crate::config::defaults::default_key_prev_paragraph(),
            key_next_paragraph: crate::config::defaults::default_key_next_paragraph(),
            cache_name: crate::config::defaults::default_cache_name(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            bypass_hosts: Vec::new(),
            manifest: Vec::new(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    /// Clamp values into the ranges the controller accepts. Applied after
    /// every load regardless of source.
    pub fn sanitized(mut self) -> Self {
        self.default_rate = sanitize_rate(self.default_rate);
        self.default_pitch = self.default_pitch.clamp(MIN_PITCH, MAX_PITCH);
        self.default_volume = self.default_volume.clamp(MIN_VOLUME, MAX_VOLUME);
        self.speed_presets.retain(|preset| preset.is_finite() && *preset > 0.0);
        for preset in &mut self.speed_presets {
            *preset = preset.clamp(MIN_RATE, MAX_RATE);
        }
        if !(self.words_per_minute.is_finite() && self.words_per_minute > 0.0) {
            self.words_per_minute = crate::config::defaults::default_words_per_minute();
        }
        self.keep_alive_interval_secs = self.keep_alive_interval_secs.max(1);
        self
    }
}

pub(crate) fn sanitize_rate(rate: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(MIN_RATE, MAX_RATE)
    } else {
        crate::config::defaults::default_rate()
    }
}

/// Where the presentation layer mounts the widget.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum WidgetPosition {
    /// Inline banner above the article.
    Top,
    /// Floating button with a pop-up panel.
    Float,
}

impl Default for WidgetPosition {
    fn default() -> Self {
        WidgetPosition::Top
    }
}

impl std::fmt::Display for WidgetPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WidgetPosition::Top => "top",
            WidgetPosition::Float => "float",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
