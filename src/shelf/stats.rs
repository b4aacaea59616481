use crate::shelf::record::TimelineEntry;
use crate::shelf::store::RecordStore;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

pub const RECENT_HOUR_BUCKETS: [i64; 7] = [1, 6, 12, 24, 48, 72, 96];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCount {
    pub hours: i64,
    pub papers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub num_papers: usize,
    pub earliest_paper: String,
    pub latest_paper: String,
    pub recent: Vec<RecentCount>,
}

fn format_day(epoch_secs: i64) -> String {
    match Local.timestamp_opt(epoch_secs, 0).single() {
        Some(dt) => dt.format("%b %d %Y").to_string(),
        None => epoch_secs.to_string(),
    }
}

pub fn corpus_stats(timeline: &dyn RecordStore<TimelineEntry>, now_epoch_secs: i64) -> CorpusStats {
    let times = timeline
        .iterate()
        .map(|(_, entry)| entry.timestamp)
        .collect::<Vec<_>>();

    let (earliest_paper, latest_paper) = match (times.iter().min(), times.iter().max()) {
        (Some(min), Some(max)) => (format_day(*min), format_day(*max)),
        _ => ("N/A".to_string(), "N/A".to_string()),
    };

    let recent = RECENT_HOUR_BUCKETS
        .iter()
        .map(|hours| {
            let cutoff = now_epoch_secs.saturating_sub(hours * 60 * 60);
            RecentCount {
                hours: *hours,
                papers: times.iter().filter(|t| **t > cutoff).count(),
            }
        })
        .collect();

    CorpusStats {
        num_papers: times.len(),
        earliest_paper,
        latest_paper,
        recent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::store::{JsonlStore, OpenMode};
    use tempfile::tempdir;

    #[test]
    fn empty_timeline_reports_not_available() {
        let tmp = tempdir().expect("tempdir");
        let timeline =
            JsonlStore::<TimelineEntry>::open(&tmp.path().join("metas.jsonl"), OpenMode::Create)
                .expect("create");
        let stats = corpus_stats(&timeline, 1_000_000);
        assert_eq!(stats.num_papers, 0);
        assert_eq!(stats.earliest_paper, "N/A");
        assert!(stats.recent.iter().all(|b| b.papers == 0));
    }

    #[test]
    fn recent_buckets_count_by_hours() {
        let tmp = tempdir().expect("tempdir");
        let mut timeline =
            JsonlStore::<TimelineEntry>::open(&tmp.path().join("metas.jsonl"), OpenMode::Create)
                .expect("create");
        let now = 1_000_000;
        for (id, age_hours) in [("a", 0), ("b", 5), ("c", 30), ("d", 200)] {
            timeline
                .set(
                    id,
                    TimelineEntry {
                        timestamp: now - age_hours * 3600 + 1,
                        id: id.to_string(),
                    },
                )
                .expect("set");
        }

        let stats = corpus_stats(&timeline, now);
        let counts = stats.recent.iter().map(|b| b.papers).collect::<Vec<_>>();
        assert_eq!(counts, vec![1, 2, 2, 2, 3, 3, 3]);
        assert_eq!(stats.num_papers, 4);
        assert_ne!(stats.latest_paper, "N/A");
    }
}
