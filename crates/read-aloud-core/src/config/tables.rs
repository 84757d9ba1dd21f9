use super::defaults;
use super::models::{AppConfig, LogLevel, WidgetPosition};
use serde::Deserialize;

/// On-disk layout of `config.toml`: one table per concern, flattened into
/// [`AppConfig`] after parsing.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    content: ContentConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    ui: UiConfig,
    #[serde(default)]
    keep_alive: KeepAliveConfig,
    #[serde(default)]
    shortcuts: ShortcutConfig,
    #[serde(default)]
    asset_cache: AssetCacheConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            content_selector: tables.content.selector,
            block_selector: tables.content.block_selector,
            min_article_chars: tables.content.min_article_chars,
            default_rate: tables.playback.default_rate,
            default_pitch: tables.playback.default_pitch,
            default_volume: tables.playback.default_volume,
            speed_presets: tables.playback.speed_presets,
            preferred_voice: tables.playback.preferred_voice,
            voice_locale_prefix: tables.playback.voice_locale_prefix,
            voice_name_hints: tables.playback.voice_name_hints,
            words_per_minute: tables.playback.words_per_minute,
            position: tables.ui.position,
            keep_alive_interval_secs: tables.keep_alive.interval_secs,
            key_toggle_play_pause: tables.shortcuts.toggle_play_pause,
            key_stop: tables.shortcuts.stop,
            key_prev_sentence: tables.shortcuts.prev_sentence,
            key_next_sentence: tables.shortcuts.next_sentence,
            key_prev_paragraph: tables.shortcuts.prev_paragraph,
            key_next_paragraph: tables.shortcuts.next_paragraph,
            cache_name: tables.asset_cache.cache_name,
            cache_dir: tables.asset_cache.cache_dir,
            bypass_hosts: tables.asset_cache.bypass_hosts,
            manifest: tables.asset_cache.manifest,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            content: ContentConfig {
                selector: config.content_selector.clone(),
                block_selector: config.block_selector.clone(),
                min_article_chars: config.min_article_chars,
            },
            playback: PlaybackConfig {
                default_rate: config.default_rate,
                default_pitch: config.default_pitch,
                default_volume: config.default_volume,
                speed_presets: config.speed_presets.clone(),
                preferred_voice: config.preferred_voice.clone(),
                voice_locale_prefix: config.voice_locale_prefix.clone(),
                voice_name_hints: config.voice_name_hints.clone(),
                words_per_minute: config.words_per_minute,
            },
            ui: UiConfig {
                position: config.position,
            },
            keep_alive: KeepAliveConfig {
                interval_secs: config.keep_alive_interval_secs,
            },
            shortcuts: ShortcutConfig {
                toggle_play_pause: config.key_toggle_play_pause.clone(),
                stop: config.key_stop.clone(),
                prev_sentence: config.key_prev_sentence.clone(),
                next_sentence: config.key_next_sentence.clone(),
                prev_paragraph: config.key_prev_paragraph.clone(),
                next_paragraph: config.key_next_paragraph.clone(),
            },
            asset_cache: AssetCacheConfig {
                cache_name: config.cache_name.clone(),
                cache_dir: config.cache_dir.clone(),
                bypass_hosts: config.bypass_hosts.clone(),
                manifest: config.manifest.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ContentConfig {
    #[serde(default)]
    selector: String,
    #[serde(default = "defaults::default_block_selector")]
    block_selector: String,
    #[serde(default = "defaults::default_min_article_chars")]
    min_article_chars: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        ContentConfig {
            selector: String::new(),
            block_selector: defaults::default_block_selector(),
            min_article_chars: defaults::default_min_article_chars(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_rate")]
    default_rate: f32,
    #[serde(default = "defaults::default_pitch")]
    default_pitch: f32,
    #[serde(default = "defaults::default_volume")]
    default_volume: f32,
    #[serde(default = "defaults::default_speed_presets")]
    speed_presets: Vec<f32>,
    #[serde(default)]
    preferred_voice: String,
    #[serde(default = "defaults::default_voice_locale_prefix")]
    voice_locale_prefix: String,
    #[serde(default = "defaults::default_voice_name_hints")]
    voice_name_hints: Vec<String>,
    #[serde(default = "defaults::default_words_per_minute")]
    words_per_minute: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            default_rate: defaults::default_rate(),
            default_pitch: defaults::default_pitch(),
            default_volume: defaults::default_volume(),
            speed_presets: defaults::default_speed_presets(),
            preferred_voice: String::new(),
            voice_locale_prefix: defaults::default_voice_locale_prefix(),
            voice_name_hints: defaults::default_voice_name_hints(),
            words_per_minute: defaults::default_words_per_minute(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
struct UiConfig {
    #[serde(default)]
    position: WidgetPosition,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeepAliveConfig {
    #[serde(default = "defaults::default_keep_alive_interval_secs")]
    interval_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        KeepAliveConfig {
            interval_secs: defaults::default_keep_alive_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ShortcutConfig {
    #[serde(default = "defaults::default_key_toggle_play_pause")]
    toggle_play_pause: String,
    #[serde(default = "defaults::default_key_stop")]
    stop: String,
    #[serde(default = "defaults::default_key_prev_sentence")]
    prev_sentence: String,
    #[serde(default = "defaults::default_key_next_sentence")]
    next_sentence: String,
    #[serde(default = "defaults::default_key_prev_paragraph")]
    prev_paragraph: String,
    #[serde(default = "defaults::default_key_next_paragraph")]
    next_paragraph: String,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        ShortcutConfig {
            toggle_play_pause: defaults::default_key_toggle_play_pause(),
            stop: defaults::default_key_stop(),
            prev_sentence: defaults::default_key_prev_sentence(),
            next_sentence: defaults::default_key_next_sentence(),
            prev_paragraph: defaults::default_key_prev_paragraph(),
            next_paragraph: defaults::default_key_next_paragraph(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct AssetCacheConfig {
    #[serde(default = "defaults::default_cache_name")]
    cache_name: String,
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
    #[serde(default)]
    bypass_hosts: Vec<String>,
    #[serde(default)]
    manifest: Vec<String>,
}

impl Default for AssetCacheConfig {
    fn default() -> Self {
        AssetCacheConfig {
            cache_name: defaults::default_cache_name(),
            cache_dir: defaults::default_cache_dir(),
            bypass_hosts: Vec::new(),
            manifest: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
