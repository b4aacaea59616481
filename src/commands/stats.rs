use anyhow::Result;

use crate::commands::CommandReport;
use crate::shelf::paths::resolve_paths;
use crate::shelf::record::TimelineEntry;
use crate::shelf::stats::corpus_stats;
use crate::shelf::store::{JsonlStore, OpenMode};
use crate::shelf::util::now_epoch_secs;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("stats");
    let timeline = JsonlStore::<TimelineEntry>::open(&paths.timeline_db, OpenMode::Read)?;

    let stats = corpus_stats(&timeline, now_epoch_secs()?);
    report.detail(format!("num_papers={}", stats.num_papers));
    report.detail(format!("earliest_paper={}", stats.earliest_paper));
    report.detail(format!("latest_paper={}", stats.latest_paper));
    for bucket in &stats.recent {
        report.detail(format!("thr_{}={}", bucket.hours, bucket.papers));
    }
    Ok(report)
}
