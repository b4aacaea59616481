use crate::error::ShelfError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfRankingConfig {
    pub max_query_tokens: usize,
    pub max_scan_records: usize,
}

impl Default for ShelfRankingConfig {
    fn default() -> Self {
        Self {
            max_query_tokens: 16,
            max_scan_records: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfIngestConfig {
    pub compact_after_run: bool,
    pub source_timeout_secs: u64,
}

impl Default for ShelfIngestConfig {
    fn default() -> Self {
        Self {
            compact_after_run: true,
            source_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShelfConfig {
    pub ranking: ShelfRankingConfig,
    pub ingest: ShelfIngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialShelfConfig {
    ranking: Option<ShelfRankingConfig>,
    ingest: Option<ShelfIngestConfig>,
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => match v.trim() {
            "1" | "true" | "TRUE" | "yes" | "on" => true,
            "0" | "false" | "FALSE" | "no" | "off" => false,
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

fn validate(cfg: &ShelfConfig) -> Result<()> {
    if cfg.ranking.max_query_tokens == 0 {
        return Err(ShelfError::InvalidConfig(
            "ranking.max_query_tokens must be >= 1".to_string(),
        )
        .into());
    }
    if cfg.ranking.max_scan_records == 0 {
        return Err(ShelfError::InvalidConfig(
            "ranking.max_scan_records must be >= 1".to_string(),
        )
        .into());
    }
    if cfg.ingest.source_timeout_secs == 0 {
        return Err(ShelfError::InvalidConfig(
            "ingest.source_timeout_secs must be >= 1".to_string(),
        )
        .into());
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("PAPERSHELF_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".papershelf").join("papershelf.toml"))
}

fn merge_file_config(base: &mut ShelfConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialShelfConfig = toml::from_str(&raw).map_err(|err| {
        ShelfError::InvalidConfig(format!("failed to parse {}: {err}", path.display()))
    })?;
    if let Some(ranking) = parsed.ranking {
        base.ranking = ranking;
    }
    if let Some(ingest) = parsed.ingest {
        base.ingest = ingest;
    }
    Ok(())
}

pub fn load_config() -> Result<ShelfConfig> {
    let mut cfg = ShelfConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.ranking.max_query_tokens =
        env_or_usize("PAPERSHELF_MAX_QUERY_TOKENS", cfg.ranking.max_query_tokens);
    cfg.ranking.max_scan_records =
        env_or_usize("PAPERSHELF_MAX_SCAN_RECORDS", cfg.ranking.max_scan_records);
    cfg.ingest.compact_after_run =
        env_or_bool("PAPERSHELF_COMPACT_AFTER_INGEST", cfg.ingest.compact_after_run);
    cfg.ingest.source_timeout_secs = env_or_u64(
        "PAPERSHELF_SOURCE_TIMEOUT_SECS",
        cfg.ingest.source_timeout_secs,
    );

    validate(&cfg)?;
    Ok(cfg)
}
