use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const META_VERSION: u32 = 1;
const DOWNLOAD_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMeta {
    pub version: u32,
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: u64,
}

/// Downloads `url` into `dest` unless the server confirms the copy on disk is
/// current (HTTP 304 against the stored ETag / Last-Modified).
pub fn fetch_file_cached(url: &str, dest: &Path) -> Result<PathBuf> {
    let client = Client::builder()
        .user_agent("playcall-terminal/0.1")
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .context("build download client")?;

    let meta = load_meta(dest).filter(|m| m.url == url && dest.exists());

    let mut req = client.get(url).header(USER_AGENT, "playcall-terminal/0.1");
    if let Some(meta) = meta.as_ref() {
        if let Some(etag) = meta.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = meta.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().with_context(|| format!("request {url}"))?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        if meta.is_some() {
            debug!(url, path = %dest.display(), "cached download still current");
            return Ok(dest.to_path_buf());
        }
        return Err(anyhow!("received 304 without a cached copy of {url}"));
    }
    if !status.is_success() {
        return Err(anyhow!("http {status} for {url}"));
    }

    let headers = resp.headers().clone();
    let bytes = resp.bytes().with_context(|| format!("read body {url}"))?;

    if let Some(dir) = dest.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let tmp = dest.with_extension("download.tmp");
    fs::write(&tmp, &bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, dest).with_context(|| format!("swap {}", dest.display()))?;

    let meta = FileMeta {
        version: META_VERSION,
        url: url.to_string(),
        etag: header_string(&headers, ETAG),
        last_modified: header_string(&headers, LAST_MODIFIED),
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    save_meta(dest, &meta)?;
    info!(url, bytes = bytes.len(), path = %dest.display(), "downloaded");
    Ok(dest.to_path_buf())
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

pub fn meta_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".meta.json");
    dest.with_file_name(name)
}

pub fn load_meta(dest: &Path) -> Option<FileMeta> {
    let raw = fs::read_to_string(meta_path(dest)).ok()?;
    let meta = serde_json::from_str::<FileMeta>(&raw).ok()?;
    (meta.version == META_VERSION).then_some(meta)
}

pub fn save_meta(dest: &Path, meta: &FileMeta) -> Result<()> {
    let path = meta_path(dest);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(meta).context("serialize download meta")?;
    fs::write(&tmp, json).context("write download meta")?;
    fs::rename(&tmp, &path).context("swap download meta")?;
    Ok(())
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
