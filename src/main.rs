//! Entry point for the terminal read-aloud player.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml` (or `--config`).
//! - Load the article from disk or through the asset cache.
//! - Segment it and hand the sentences to the playback runtime.

mod audio;
mod cancellation;
mod runtime;

use crate::audio::EspeakEngine;
use anyhow::{Context, Result, anyhow};
use read_aloud_core::asset_cache::{AssetCache, HttpFetcher};
use read_aloud_core::config::{AppConfig, load_config, serialize_config};
use read_aloud_core::engine::event_channel;
use read_aloud_core::{PlaybackController, ReadAloudError, Segmenter};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str =
    "Usage: read-aloud [--config PATH] [--selector CSS] [--print-config] <file.html | URL>";

#[derive(Debug, PartialEq)]
struct Args {
    config_path: PathBuf,
    selector: Option<String>,
    print_config: bool,
    source: Option<String>,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        // Startup failures from the library were already logged where they
        // were detected.
        let terminal = err
            .downcast_ref::<ReadAloudError>()
            .is_some_and(ReadAloudError::is_terminal);
        if terminal {
            eprintln!("{err:#}");
        } else {
            error!("{err:?}");
        }
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    if args.print_config {
        print!("{}", serialize_config(&config).context("Encoding configuration")?);
        return Ok(());
    }
    let source = args.source.ok_or_else(|| anyhow!("{USAGE}"))?;
    info!(
        source = %source,
        level = %config.log_level,
        "Starting read-aloud"
    );

    let html = load_source(&source, &config)?;
    let sentences = Segmenter::from_config(&config)
        .with_selector(args.selector.clone())
        .segment_html(&html)
        .context("Finding readable article content")?;

    let (events, engine_events) = event_channel();
    let engine = EspeakEngine::new(events);
    let mut controller = PlaybackController::new(engine, sentences, &config)
        .context("Starting speech; is espeak-ng installed?")?;

    let snapshot = controller.snapshot();
    println!("Listen to this article: {}", snapshot.banner_meta);
    println!("{}", snapshot.status_line);
    println!("{}", runtime::HELP);

    runtime::run(&mut controller, engine_events, &config)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut config_path = PathBuf::from("conf/config.toml");
    let mut selector = None;
    let mut print_config = false;
    let mut source = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or_else(|| anyhow!("--config needs a path\n{USAGE}"))?;
                config_path = PathBuf::from(value);
            }
            "--selector" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--selector needs a CSS selector\n{USAGE}"))?;
                selector = Some(value);
            }
            "--print-config" => print_config = true,
            "-h" | "--help" => return Err(anyhow!("{USAGE}")),
            flag if flag.starts_with("--") => return Err(anyhow!("Unknown flag {flag}\n{USAGE}")),
            _ if source.is_none() => source = Some(arg),
            _ => return Err(anyhow!("Unexpected argument {arg}\n{USAGE}")),
        }
    }

    if source.is_none() && !print_config {
        return Err(anyhow!("{USAGE}"));
    }
    Ok(Args {
        config_path,
        selector,
        print_config,
        source,
    })
}

fn load_source(source: &str, config: &AppConfig) -> Result<String> {
    if !(source.starts_with("http://") || source.starts_with("https://")) {
        let path = PathBuf::from(source);
        if !path.exists() {
            return Err(anyhow!("File not found: {}", path.display()));
        }
        return fs::read_to_string(&path)
            .with_context(|| format!("Reading article {}", path.display()));
    }

    let fetcher = Arc::new(HttpFetcher::new().context("Preparing HTTP client")?);
    let cache = AssetCache::from_config(config, fetcher).context("Opening asset cache")?;
    if let Err(err) = cache.activate() {
        warn!("Could not prune old asset caches: {err}");
    }
    if !config.manifest.is_empty() {
        if let Err(err) = cache.install(&config.manifest) {
            warn!("Asset manifest not cached: {err}");
        }
    }
    let response = cache
        .fetch(source)
        .with_context(|| format!("Fetching article {source}"))?;
    info!(
        url = source,
        source = ?response.source,
        bytes = response.body.len(),
        "Loaded article"
    );
    Ok(response.text())
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Args> {
        parse_args(raw.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn source_is_required() {
        assert!(args(&[]).is_err());
    }

    #[test]
    fn flags_and_source_in_any_order() {
        let parsed = args(&["--selector", ".post", "page.html", "--config", "my.toml"]).unwrap();
        assert_eq!(
            parsed,
            Args {
                config_path: PathBuf::from("my.toml"),
                selector: Some(".post".to_string()),
                print_config: false,
                source: Some("page.html".to_string()),
            }
        );
    }

    #[test]
    fn print_config_needs_no_source() {
        let parsed = args(&["--print-config"]).unwrap();
        assert!(parsed.print_config);
        assert_eq!(parsed.source, None);
    }

    #[test]
    fn missing_article_is_a_terminal_error() {
        let err = anyhow::Error::new(ReadAloudError::NoContentFound).context("Finding readable article content");
        assert!(
            err.downcast_ref::<ReadAloudError>()
                .is_some_and(ReadAloudError::is_terminal)
        );
        assert!(format!("{err:#}").contains("no readable content found"));
    }

    #[test]
    fn rejects_unknown_flags_and_extra_sources() {
        assert!(args(&["--fast", "page.html"]).is_err());
        assert!(args(&["a.html", "b.html"]).is_err());
    }
}
