pub(crate) fn default_block_selector() -> String {
    "p, li, h1, h2, h3, h4, h5, h6, blockquote, figcaption, td, dt, dd".to_string()
}

pub(crate) fn default_min_article_chars() -> usize {
    200
}

pub(crate) fn default_rate() -> f32 {
    1.0
}

pub(crate) fn default_pitch() -> f32 {
    1.0
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_speed_presets() -> Vec<f32> {
    vec![0.9, 1.0, 1.1, 1.2, 1.25]
}

pub(crate) fn default_voice_locale_prefix() -> String {
    "en".to_string()
}

pub(crate) fn default_voice_name_hints() -> Vec<String> {
    vec![
        "Natural".to_string(),
        "Enhanced".to_string(),
        "Google".to_string(),
    ]
}

pub(crate) fn default_words_per_minute() -> f32 {
    150.0
}

pub(crate) fn default_keep_alive_interval_secs() -> u64 {
    10
}

pub(crate) fn default_key_toggle_play_pause() -> String {
    "space".to_string()
}

pub(crate) fn default_key_stop() -> String {
    "escape".to_string()
}

pub(crate) fn default_key_prev_sentence() -> String {
    "left".to_string()
}

pub(crate) fn default_key_next_sentence() -> String {
    "right".to_string()
}

pub(crate) fn default_key_prev_paragraph() -> String {
    "shift+left".to_string()
}

pub(crate) fn default_key_next_paragraph() -> String {
    "shift+right".to_string()
}

pub(crate) fn default_cache_name() -> String {
    "readaloud-v1".to_string()
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
