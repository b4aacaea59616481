use crate::error::ShelfError;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAuthors {
    One(String),
    Many(Vec<String>),
}

/// Seconds since epoch or a bare year. Fractional values are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Whole(i64),
    Fractional(f64),
}

impl RawTimestamp {
    pub fn seconds(self) -> i64 {
        match self {
            Self::Whole(secs) => secs,
            Self::Fractional(secs) => secs.trunc() as i64,
        }
    }
}

/// One row as exported by the upstream bibliography database.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPaper {
    #[serde(default)]
    pub authors: Option<RawAuthors>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "id", alias = "_id")]
    pub doi: Option<String>,
    #[serde(default, alias = "timestamp", alias = "_time")]
    pub year: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub rows: Vec<RawPaper>,
    /// Rows that were not even shaped like a paper.
    pub malformed: usize,
}

pub trait PaperSource {
    fn describe(&self) -> String;
    fn fetch(&mut self) -> Result<SourceBatch>;
}

/// Parse either a JSON array of rows or JSON Lines, one row per line.
pub fn parse_rows(raw: &str) -> SourceBatch {
    let mut batch = SourceBatch::default();
    let trimmed = raw.trim_start();

    if trimmed.starts_with('[') {
        let Ok(items) = serde_json::from_str::<Vec<Value>>(trimmed) else {
            batch.malformed += 1;
            return batch;
        };
        for item in items {
            match serde_json::from_value::<RawPaper>(item) {
                Ok(row) => batch.rows.push(row),
                Err(_) => batch.malformed += 1,
            }
        }
        return batch;
    }

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawPaper>(line) {
            Ok(row) => batch.rows.push(row),
            Err(_) => batch.malformed += 1,
        }
    }
    batch
}

#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    raw: Option<String>,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            ShelfError::SourceUnavailable(format!("failed to read {}: {err}", path.display()))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            raw: Some(raw),
        })
    }
}

impl PaperSource for FileSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn fetch(&mut self) -> Result<SourceBatch> {
        let raw = self
            .raw
            .take()
            .with_context(|| format!("source {} already consumed", self.path.display()))?;
        Ok(parse_rows(&raw))
    }
}

#[derive(Debug)]
pub struct HttpSource {
    url: String,
    client: Client,
    token: Option<String>,
}

impl HttpSource {
    pub fn open(url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| {
                ShelfError::SourceUnavailable(format!("failed to build http client: {err}"))
            })?;
        let token = env::var("PAPERSHELF_SOURCE_TOKEN")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(Self {
            url: url.to_string(),
            client,
            token,
        })
    }
}

impl PaperSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&mut self) -> Result<SourceBatch> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().map_err(|err| {
            ShelfError::SourceUnavailable(format!("request to {} failed: {err}", self.url))
        })?;
        if !response.status().is_success() {
            return Err(ShelfError::SourceUnavailable(format!(
                "{} answered {}",
                self.url,
                response.status()
            ))
            .into());
        }
        let body = response
            .text()
            .with_context(|| format!("failed to read body from {}", self.url))?;
        Ok(parse_rows(&body))
    }
}

fn is_http_location(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Open the configured source once. Failing here aborts the run.
pub fn open_source(location: &str, timeout_secs: u64) -> Result<Box<dyn PaperSource>> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ShelfError::SourceUnavailable("no source location given".to_string()).into());
    }
    if is_http_location(location) {
        return Ok(Box::new(HttpSource::open(location, timeout_secs)?));
    }
    Ok(Box::new(FileSource::open(Path::new(location))?))
}
