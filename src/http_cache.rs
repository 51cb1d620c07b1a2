use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::FetchError;

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "fbref_matches";
const PAGES_DIR: &str = "pages";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    url: String,
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

pub fn fetch_html(client: &Client, url: &str, timeout: Duration) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .map_err(|e| classify(url, timeout, e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Navigation {
            url: url.to_string(),
            message: format!("http {status}"),
        });
    }
    resp.text().map_err(|e| classify(url, timeout, e))
}

pub fn fetch_html_cached(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let path = entry_path(url);
    let cached = path.as_ref().and_then(|p| load_entry(p, url));

    let mut req = client.get(url).timeout(timeout);
    if let Some(entry) = cached.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().map_err(|e| classify(url, timeout, e))?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        return match cached {
            Some(entry) => {
                debug!("page cache hit for {url}");
                Ok(entry.body)
            }
            None => Err(FetchError::Navigation {
                url: url.to_string(),
                message: "received 304 without cached body".to_string(),
            }),
        };
    }
    if !status.is_success() {
        return Err(FetchError::Navigation {
            url: url.to_string(),
            message: format!("http {status}"),
        });
    }

    let headers = resp.headers().clone();
    let body = resp.text().map_err(|e| classify(url, timeout, e))?;

    let entry = CacheEntry {
        version: CACHE_VERSION,
        url: url.to_string(),
        body: body.clone(),
        etag: header_string(&headers, ETAG),
        last_modified: header_string(&headers, LAST_MODIFIED),
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    if let Some(path) = path
        && let Err(err) = save_entry(&path, &entry)
    {
        warn!("page cache write failed for {url}: {err:#}");
    }
    Ok(body)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub(crate) fn classify(url: &str, timeout: Duration, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            after: timeout,
        }
    } else if let Some(status) = err.status() {
        FetchError::Navigation {
            url: url.to_string(),
            message: format!("http {status}"),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

fn entry_path(url: &str) -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(PAGES_DIR).join(entry_file_name(url)))
}

fn entry_file_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{}.json", URL_SAFE_NO_PAD.encode(digest))
}

fn load_entry(path: &Path, url: &str) -> Option<CacheEntry> {
    let raw = fs::read_to_string(path).ok()?;
    let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
    (entry.version == CACHE_VERSION && entry.url == url).then_some(entry)
}

fn save_entry(path: &Path, entry: &CacheEntry) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("create page cache dir")?;
    }
    // Unique temp name so parallel writers of one URL never share a file.
    let tmp = path.with_extension(format!("json.{:08x}.tmp", rand::random::<u32>()));
    let json = serde_json::to_string(entry).context("serialize page cache entry")?;
    fs::write(&tmp, json).context("write page cache entry")?;
    fs::rename(&tmp, path).context("swap page cache entry")?;
    Ok(())
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
