use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::shelf::config::load_config;
use crate::shelf::paths::resolve_paths;
use crate::shelf::record::{PaperRecord, TimelineEntry};
use crate::shelf::store::{JsonlStore, OpenMode, RecordStore, writer_active};

include!(concat!(env!("OUT_DIR"), "/papershelf_env_allowlist.rs"));

fn env_overrides() -> Vec<&'static str> {
    GENERATED_PAPERSHELF_ENV_ALLOWLIST
        .iter()
        .copied()
        .filter(|key| env::var_os(key).is_some_and(|v| !v.is_empty()))
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("build={}", env!("BUILD_UUID")));
    report.detail(format!("shelf_home={}", paths.shelf_home.display()));
    report.detail(format!("corpus_db={}", paths.corpus_db.display()));
    report.detail(format!("timeline_db={}", paths.timeline_db.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));

    match load_config() {
        Ok(cfg) => {
            report.detail(format!(
                "ranking.max_query_tokens={}",
                cfg.ranking.max_query_tokens
            ));
            report.detail(format!(
                "ranking.max_scan_records={}",
                cfg.ranking.max_scan_records
            ));
            report.detail(format!(
                "ingest.compact_after_run={}",
                cfg.ingest.compact_after_run
            ));
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    let overrides = env_overrides();
    if !overrides.is_empty() {
        report.detail(format!("env_overrides={}", overrides.join(",")));
    }

    match JsonlStore::<PaperRecord>::open(&paths.corpus_db, OpenMode::Read) {
        Ok(store) => {
            report.detail(format!("corpus.records={}", store.len()));
            report.detail(format!("corpus.shadowed_lines={}", store.shadowed_lines()));
            if store.corrupt_lines() > 0 {
                report.issue(format!(
                    "corpus has {} unparsable line(s); run `papershelf compact`",
                    store.corrupt_lines()
                ));
            }
        }
        Err(err) => report.issue(format!("corpus store unreadable: {err:#}")),
    }
    match JsonlStore::<TimelineEntry>::open(&paths.timeline_db, OpenMode::Read) {
        Ok(store) => {
            report.detail(format!("timeline.records={}", store.len()));
            report.detail(format!(
                "timeline.shadowed_lines={}",
                store.shadowed_lines()
            ));
            if store.corrupt_lines() > 0 {
                report.issue(format!(
                    "timeline has {} unparsable line(s); run `papershelf compact`",
                    store.corrupt_lines()
                ));
            }
        }
        Err(err) => report.issue(format!("timeline store unreadable: {err:#}")),
    }

    match writer_active(&paths.corpus_db) {
        Ok(active) => report.detail(format!("corpus.writer_active={active}")),
        Err(err) => report.issue(format!("corpus lock unreadable: {err:#}")),
    }

    Ok(report)
}
