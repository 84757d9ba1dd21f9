//! Offline cache for the widget's assets and fetched articles.
//!
//! Each named cache is a directory under the configured cache root. Entries
//! are stored as `<sha256(url)>.body` with a small TOML sidecar holding the
//! URL and content type. Lookups are cache-first: a hit is returned at once
//! and refreshed from the network in the background. Hosts on the bypass
//! list always go straight to the network and are never stored.

use crate::config::AppConfig;
use crate::error::{ReadAloudError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const CACHE_MARKER: &str = ".read-aloud-cache";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedAsset>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("read-aloud/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| ReadAloudError::AssetCache(format!("http client: {err}")))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| ReadAloudError::AssetCache(format!("GET {url}: {err}")))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .map_err(|err| ReadAloudError::AssetCache(format!("reading {url}: {err}")))?;
        Ok(FetchedAsset {
            body: body.to_vec(),
            content_type,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    Bypass,
}

#[derive(Debug)]
pub struct CachedResponse {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub source: ResponseSource,
    /// Background refresh of a cache hit. Dropping it detaches the thread.
    pub refresh: Option<JoinHandle<()>>,
}

impl CachedResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    content_type: Option<String>,
    stored_at: u64,
}

pub struct AssetCache {
    root: PathBuf,
    name: String,
    dir: PathBuf,
    bypass_hosts: Vec<String>,
    fetcher: Arc<dyn Fetcher>,
}

impl AssetCache {
    pub fn open(
        root: impl Into<PathBuf>,
        name: &str,
        bypass_hosts: Vec<String>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let root = root.into();
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ReadAloudError::AssetCache(format!(
                "invalid cache name {name:?}"
            )));
        }
        let dir = root.join(name);
        fs::create_dir_all(&dir).map_err(|err| io_error(&dir, err))?;
        let marker = dir.join(CACHE_MARKER);
        if !marker.exists() {
            fs::write(&marker, name).map_err(|err| io_error(&marker, err))?;
        }
        debug!(dir = %dir.display(), "Opened asset cache");
        Ok(Self {
            root,
            name: name.to_string(),
            dir,
            bypass_hosts: bypass_hosts
                .into_iter()
                .map(|host| host.trim().to_ascii_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
            fetcher,
        })
    }

    pub fn from_config(config: &AppConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        Self::open(
            &config.cache_dir,
            &config.cache_name,
            config.bypass_hosts.clone(),
            fetcher,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pre-cache every asset in `manifest`. Nothing is stored unless every
    /// fetch succeeds.
    pub fn install(&self, manifest: &[String]) -> Result<usize> {
        let mut fetched = Vec::with_capacity(manifest.len());
        for url in manifest {
            let asset = self.fetcher.fetch(url).map_err(|err| {
                warn!(url = %url, "Asset cache install failed: {err}");
                err
            })?;
            fetched.push((url, asset));
        }
        for (url, asset) in &fetched {
            store_entry(&self.dir, url, asset)?;
        }
        info!(cache = %self.name, assets = fetched.len(), "Asset cache installed");
        Ok(fetched.len())
    }

    /// Delete every sibling cache with a different name. Only directories
    /// carrying the cache marker are touched; anything else under the root
    /// belongs to someone else. Returns the names removed.
    pub fn activate(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|err| io_error(&self.root, err))?;
        let mut removed = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || !path.join(CACHE_MARKER).is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == self.name {
                continue;
            }
            fs::remove_dir_all(&path).map_err(|err| io_error(&path, err))?;
            debug!(cache = %name, "Removed stale asset cache");
            removed.push(name);
        }
        if !removed.is_empty() {
            info!(cache = %self.name, removed = removed.len(), "Asset cache activated");
        }
        Ok(removed)
    }

    pub fn is_bypassed(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        self.bypass_hosts.iter().any(|bypass| {
            host == *bypass
                || host
                    .strip_suffix(bypass.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn fetch(&self, url: &str) -> Result<CachedResponse> {
        if self.is_bypassed(url) {
            debug!(url, "Bypassing asset cache");
            let asset = self.fetcher.fetch(url)?;
            return Ok(response(asset, ResponseSource::Bypass, None));
        }

        if let Some(asset) = load_entry(&self.dir, url) {
            debug!(url, "Asset cache hit");
            let refresh = self.spawn_refresh(url);
            return Ok(response(asset, ResponseSource::Cache, Some(refresh)));
        }

        debug!(url, "Asset cache miss");
        let asset = self.fetcher.fetch(url)?;
        if let Err(err) = store_entry(&self.dir, url, &asset) {
            warn!(url, "Could not store fetched asset: {err}");
        }
        Ok(response(asset, ResponseSource::Network, None))
    }

    fn spawn_refresh(&self, url: &str) -> JoinHandle<()> {
        let fetcher = Arc::clone(&self.fetcher);
        let dir = self.dir.clone();
        let url = url.to_string();
        thread::spawn(move || match fetcher.fetch(&url) {
            Ok(asset) => {
                if let Err(err) = store_entry(&dir, &url, &asset) {
                    warn!(url = %url, "Could not refresh cached asset: {err}");
                } else {
                    debug!(url = %url, "Refreshed cached asset");
                }
            }
            Err(err) => debug!(url = %url, "Background refresh failed: {err}"),
        })
    }
}

fn response(
    asset: FetchedAsset,
    source: ResponseSource,
    refresh: Option<JoinHandle<()>>,
) -> CachedResponse {
    CachedResponse {
        body: asset.body,
        content_type: asset.content_type,
        source,
        refresh,
    }
}

pub fn entry_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn entry_paths(dir: &Path, url: &str) -> (PathBuf, PathBuf) {
    let key = entry_key(url);
    (dir.join(format!("{key}.body")), dir.join(format!("{key}.toml")))
}

fn load_entry(dir: &Path, url: &str) -> Option<FetchedAsset> {
    let (body_path, meta_path) = entry_paths(dir, url);
    let meta = fs::read_to_string(meta_path).ok()?;
    let entry: CacheEntry = toml::from_str(&meta).ok()?;
    if entry.url != url {
        return None;
    }
    let body = fs::read(body_path).ok()?;
    Some(FetchedAsset {
        body,
        content_type: entry.content_type,
    })
}

fn store_entry(dir: &Path, url: &str, asset: &FetchedAsset) -> Result<()> {
    let (body_path, meta_path) = entry_paths(dir, url);
    fs::create_dir_all(dir).map_err(|err| io_error(dir, err))?;
    fs::write(&body_path, &asset.body).map_err(|err| io_error(&body_path, err))?;

    let entry = CacheEntry {
        url: url.to_string(),
        content_type: asset.content_type.clone(),
        stored_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default(),
    };
    let contents = toml::to_string(&entry)
        .map_err(|err| ReadAloudError::AssetCache(format!("encoding entry for {url}: {err}")))?;
    fs::write(&meta_path, contents).map_err(|err| io_error(&meta_path, err))
}

fn io_error(path: &Path, err: std::io::Error) -> ReadAloudError {
    ReadAloudError::AssetCache(format!("{}: {err}", path.display()))
}
