use crate::shelf::config::ShelfConfig;
use crate::shelf::normalize::normalize_batch;
use crate::shelf::paths::ShelfPaths;
use crate::shelf::record::{PaperRecord, TimelineEntry};
use crate::shelf::source::PaperSource;
use crate::shelf::store::{JsonlStore, OpenMode, RecordStore};
use crate::shelf::warn::{self, WarnEvent};
use anyhow::{Context, Result};

#[derive(Debug, Clone, Default)]
pub struct UpsertOutcome {
    pub upserted: usize,
    pub failed: usize,
    pub failed_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub source: String,
    pub fetched: usize,
    pub malformed: usize,
    pub dropped: usize,
    pub accepted: usize,
    pub upserted: usize,
    pub failed: usize,
    pub failed_ids: Vec<String>,
    pub corpus_size: usize,
    pub timeline_size: usize,
    pub compacted: bool,
    pub dry_run: bool,
}

fn upsert_one(
    record: PaperRecord,
    corpus: &mut dyn RecordStore<PaperRecord>,
    timeline: &mut dyn RecordStore<TimelineEntry>,
) -> Result<()> {
    let entry = TimelineEntry::from(&record);
    let id = record.id.clone();
    corpus
        .set(&id, record)
        .with_context(|| format!("corpus write failed for {id}"))?;
    timeline
        .set(&id, entry)
        .with_context(|| format!("timeline write failed for {id}"))?;
    Ok(())
}

/// Write every record into both stores. A failed record is reported and
/// skipped; the batch always runs to the end.
pub fn upsert_all(
    records: Vec<PaperRecord>,
    corpus: &mut dyn RecordStore<PaperRecord>,
    timeline: &mut dyn RecordStore<TimelineEntry>,
) -> UpsertOutcome {
    let mut out = UpsertOutcome::default();
    for record in records {
        let id = record.id.clone();
        match upsert_one(record, corpus, timeline) {
            Ok(()) => out.upserted += 1,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "UPSERT_FAILED",
                    stage: "ingest",
                    action: "store-set",
                    record: &id,
                    retry: "rerun-ingest",
                    reason: "store-write-failed",
                    err: &format!("{err:#}"),
                });
                out.failed += 1;
                out.failed_ids.push(id);
            }
        }
    }
    out
}

fn compact_store<T>(store: &mut JsonlStore<T>) -> bool
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    match store.compact() {
        Ok(_) => true,
        Err(err) => {
            warn::emit(WarnEvent {
                code: "COMPACT_FAILED",
                stage: "ingest",
                action: "compact",
                record: &store.path().display().to_string(),
                retry: "run-compact",
                reason: "store-rewrite-failed",
                err: &format!("{err:#}"),
            });
            false
        }
    }
}

/// One ingestion run: fetch, normalize, order newest first, upsert.
pub fn run_ingest(
    paths: &ShelfPaths,
    cfg: &ShelfConfig,
    source: &mut dyn PaperSource,
    dry_run: bool,
) -> Result<IngestOutcome> {
    let mut out = IngestOutcome {
        source: source.describe(),
        dry_run,
        ..IngestOutcome::default()
    };

    let batch = source
        .fetch()
        .with_context(|| format!("failed to fetch rows from {}", out.source))?;
    out.fetched = batch.rows.len();
    out.malformed = batch.malformed;

    let (records, dropped) = normalize_batch(batch.rows);
    out.dropped = dropped;
    out.accepted = records.len();

    if dry_run {
        return Ok(out);
    }

    let mut corpus = JsonlStore::<PaperRecord>::open(&paths.corpus_db, OpenMode::Create)?;
    let mut timeline = JsonlStore::<TimelineEntry>::open(&paths.timeline_db, OpenMode::Create)?;

    let upserts = upsert_all(records, &mut corpus, &mut timeline);
    out.upserted = upserts.upserted;
    out.failed = upserts.failed;
    out.failed_ids = upserts.failed_ids;

    if cfg.ingest.compact_after_run {
        let corpus_ok = compact_store(&mut corpus);
        let timeline_ok = compact_store(&mut timeline);
        out.compacted = corpus_ok && timeline_ok;
    }

    out.corpus_size = corpus.len();
    out.timeline_size = timeline.len();
    corpus.close()?;
    timeline.close()?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::paths::test_paths;
    use crate::shelf::source::{RawAuthors, RawPaper, RawTimestamp, SourceBatch};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    struct FixedSource(Vec<RawPaper>);

    impl PaperSource for FixedSource {
        fn describe(&self) -> String {
            "fixed".to_string()
        }

        fn fetch(&mut self) -> Result<SourceBatch> {
            Ok(SourceBatch {
                rows: std::mem::take(&mut self.0),
                malformed: 0,
            })
        }
    }

    /// In-memory store that refuses writes for chosen keys.
    struct FlakyStore<T> {
        entries: BTreeMap<String, T>,
        refuse: Vec<String>,
    }

    impl<T> Default for FlakyStore<T> {
        fn default() -> Self {
            Self {
                entries: BTreeMap::new(),
                refuse: Vec::new(),
            }
        }
    }

    impl<T> RecordStore<T> for FlakyStore<T> {
        fn get(&self, key: &str) -> Option<&T> {
            self.entries.get(key)
        }

        fn set(&mut self, key: &str, doc: T) -> Result<()> {
            if self.refuse.iter().any(|k| k == key) {
                anyhow::bail!("disk full");
            }
            self.entries.insert(key.to_string(), doc);
            Ok(())
        }

        fn iterate(&self) -> Box<dyn Iterator<Item = (&str, &T)> + '_> {
            Box::new(self.entries.iter().map(|(k, v)| (k.as_str(), v)))
        }

        fn len(&self) -> usize {
            self.entries.len()
        }
    }

    fn row(id: &str, title: &str, year: i64) -> RawPaper {
        RawPaper {
            authors: Some(RawAuthors::One("Karin Larsson 1".to_string())),
            title: Some(title.to_string()),
            doi: Some(id.to_string()),
            year: Some(RawTimestamp::Whole(year)),
        }
    }

    fn record(id: &str, ts: i64) -> PaperRecord {
        PaperRecord {
            authors: Vec::new(),
            title: id.to_string(),
            summary: String::new(),
            timestamp: ts,
            id: id.to_string(),
        }
    }

    #[test]
    fn failed_records_are_counted_and_the_batch_continues() {
        let mut corpus = FlakyStore::<PaperRecord> {
            refuse: vec!["b".to_string()],
            ..FlakyStore::default()
        };
        let mut timeline = FlakyStore::<TimelineEntry>::default();

        let out = upsert_all(
            vec![record("a", 3), record("b", 2), record("c", 1)],
            &mut corpus,
            &mut timeline,
        );
        assert_eq!(out.upserted, 2);
        assert_eq!(out.failed, 1);
        assert_eq!(out.failed_ids, vec!["b".to_string()]);
        assert!(timeline.get("b").is_none());
        assert!(corpus.get("c").is_some());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        let mut source = FixedSource(vec![row("a", "A", 2020)]);

        let out = run_ingest(&paths, &ShelfConfig::default(), &mut source, true).expect("ingest");
        assert_eq!(out.accepted, 1);
        assert_eq!(out.upserted, 0);
        assert!(!paths.corpus_db.exists());
    }

    #[test]
    fn ingesting_twice_keeps_one_entry_with_latest_values() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        let cfg = ShelfConfig::default();

        let mut first = FixedSource(vec![row("10.1/x", "Old title", 2019)]);
        run_ingest(&paths, &cfg, &mut first, false).expect("first run");
        let mut second = FixedSource(vec![row("10.1/x", "New title", 2021)]);
        let out = run_ingest(&paths, &cfg, &mut second, false).expect("second run");
        assert_eq!(out.corpus_size, 1);
        assert_eq!(out.timeline_size, 1);
        assert!(out.compacted);

        let corpus = JsonlStore::<PaperRecord>::open(&paths.corpus_db, OpenMode::Read).expect("corpus");
        let timeline =
            JsonlStore::<TimelineEntry>::open(&paths.timeline_db, OpenMode::Read).expect("timeline");
        let doc = corpus.get("10.1/x").expect("stored");
        assert_eq!(doc.title, "New title");
        assert_eq!(doc.authors, vec!["Karin Larsson".to_string()]);
        assert_eq!(timeline.get("10.1/x").map(|e| e.timestamp), Some(2021));
        assert_eq!(corpus.shadowed_lines(), 0);
    }

    #[test]
    fn rows_missing_fields_never_reach_the_store() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        let mut broken = row("bad", "B", 2020);
        broken.title = None;
        let mut source = FixedSource(vec![row("good", "G", 2020), broken]);

        let out =
            run_ingest(&paths, &ShelfConfig::default(), &mut source, false).expect("ingest");
        assert_eq!(out.dropped, 1);
        assert_eq!(out.upserted, 1);

        let corpus = JsonlStore::<PaperRecord>::open(&paths.corpus_db, OpenMode::Read).expect("corpus");
        assert!(corpus.get("bad").is_none());
    }
}
