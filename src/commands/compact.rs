use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::commands::{CommandReport, audit_report};
use crate::shelf::paths::resolve_paths;
use crate::shelf::record::{PaperRecord, TimelineEntry};
use crate::shelf::store::{JsonlStore, OpenMode};

fn compact_one<T: Serialize + DeserializeOwned>(name: &str, path: &std::path::Path) -> Result<CommandReport> {
    let mut report = CommandReport::new(format!("compact-{name}"));
    if !path.exists() {
        report.issue(format!("{name} store missing ({})", path.display()));
        return Ok(report);
    }

    let mut store = JsonlStore::<T>::open(path, OpenMode::Create)?;
    let shadowed = store.shadowed_lines();
    let live = store.compact()?;
    store.close()?;

    report.detail(format!("{name}.live={live}"));
    report.detail(format!("{name}.dropped_lines={shadowed}"));
    Ok(report)
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("compact");

    report.merge(compact_one::<PaperRecord>("corpus", &paths.corpus_db)?);
    report.merge(compact_one::<TimelineEntry>("timeline", &paths.timeline_db)?);

    audit_report(&paths, &mut report);
    Ok(report)
}
