use anyhow::Result;

use crate::commands::{CommandReport, audit_report};
use crate::shelf::config::load_config;
use crate::shelf::ingest::run_ingest;
use crate::shelf::paths::resolve_paths;
use crate::shelf::source::open_source;

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub source: String,
    pub dry_run: bool,
}

pub fn run(opts: &IngestOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("ingest");

    report.detail(format!("corpus_db={}", paths.corpus_db.display()));
    report.detail(format!("timeline_db={}", paths.timeline_db.display()));

    let mut source = open_source(&opts.source, cfg.ingest.source_timeout_secs)?;
    let out = run_ingest(&paths, &cfg, source.as_mut(), opts.dry_run)?;

    report.detail(format!("source={}", out.source));
    report.detail(format!("fetched={}", out.fetched));
    report.detail(format!("malformed={}", out.malformed));
    report.detail(format!("dropped={}", out.dropped));
    report.detail(format!("accepted={}", out.accepted));

    if out.dry_run {
        report.detail("dry-run: normalized rows, nothing written".to_string());
        return Ok(report);
    }

    report.detail(format!("upserted={}", out.upserted));
    report.detail(format!("failed={}", out.failed));
    report.detail(format!("corpus_size={}", out.corpus_size));
    report.detail(format!("timeline_size={}", out.timeline_size));
    report.detail(format!("compacted={}", out.compacted));
    if out.failed > 0 {
        report.issue(format!(
            "{} record(s) failed to upsert: {}",
            out.failed,
            out.failed_ids.join(",")
        ));
    }

    audit_report(&paths, &mut report);
    Ok(report)
}
