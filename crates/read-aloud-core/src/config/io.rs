use super::models::AppConfig;
use super::tables::ConfigTables;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    let tables: ConfigTables = toml::from_str(contents)?;
    Ok(AppConfig::from(tables).sanitized())
}

pub fn serialize_config(config: &AppConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&ConfigTables::from(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, WidgetPosition};

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.speed_presets, vec![0.9, 1.0, 1.1, 1.2, 1.25]);
        assert_eq!(config.key_toggle_play_pause, "space");
        assert_eq!(config.cache_name, "readaloud-v1");
        assert_eq!(config.position, WidgetPosition::Top);
    }

    #[test]
    fn tables_map_onto_flat_config() {
        let config = parse_config(
            r#"
            [content]
            selector = ".post"

            [playback]
            default_rate = 1.25
            preferred_voice = "Daniel"

            [ui]
            position = "float"

            [asset_cache]
            bypass_hosts = ["proxy.example.com"]

            [logging]
            log_level = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(config.content_selector, ".post");
        assert!((config.default_rate - 1.25).abs() < f32::EPSILON);
        assert_eq!(config.preferred_voice, "Daniel");
        assert_eq!(config.position, WidgetPosition::Float);
        assert_eq!(config.bypass_hosts, vec!["proxy.example.com"]);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            r#"
            [playback]
            default_pitch = 3.0
            default_volume = -1.0
            default_rate = 40.0
            speed_presets = [0.0, 1.0, -2.0]
            "#,
        )
        .unwrap();
        assert!((config.default_pitch - 1.5).abs() < f32::EPSILON);
        assert!(config.default_volume.abs() < f32::EPSILON);
        assert!((config.default_rate - 10.0).abs() < f32::EPSILON);
        assert_eq!(config.speed_presets, vec![1.0]);
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = AppConfig::default();
        config.preferred_voice = "Samantha".to_string();
        let text = serialize_config(&config).unwrap();
        assert!(text.contains("[playback]"));
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.preferred_voice, "Samantha");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/definitely/not/here.toml"));
        assert_eq!(config.keep_alive_interval_secs, 10);
    }
}
