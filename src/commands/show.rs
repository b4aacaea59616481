use anyhow::Result;

use crate::commands::CommandReport;
use crate::shelf::paths::resolve_paths;
use crate::shelf::record::{PaperRecord, PaperView};
use crate::shelf::store::{JsonlStore, OpenMode, RecordStore};

pub fn run(id: &str) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("show");
    let corpus = JsonlStore::<PaperRecord>::open(&paths.corpus_db, OpenMode::Read)?;

    let Some(record) = corpus.get(id) else {
        report.issue(format!("no paper with id {id}"));
        return Ok(report);
    };

    let view = PaperView::from_record(record, 0.0);
    report.detail(format!("id={}", view.id));
    report.detail(format!("title={}", view.title));
    report.detail(format!("authors={}", view.authors));
    report.detail(format!("time={}", view.time));
    report.detail(format!("summary={}", view.summary));
    Ok(report)
}
