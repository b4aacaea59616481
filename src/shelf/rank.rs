use crate::shelf::config::ShelfRankingConfig;
use crate::shelf::record::{PaperRecord, TimelineEntry};
use crate::shelf::sanitize::sanitize_query;
use crate::shelf::store::RecordStore;
use crate::shelf::util::SECS_PER_DAY;
use crate::shelf::warn::{self, WarnEvent};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const AUTHOR_WEIGHT: f64 = 10.0;
const TITLE_WEIGHT: f64 = 20.0;
const SUMMARY_WEIGHT: f64 = 1.0;
const SUMMARY_MATCH_CAP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMode {
    Search,
    Time,
    Random,
}

impl RankMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Time => "time",
            Self::Random => "random",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "search" => Some(Self::Search),
            "time" => Some(Self::Time),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Parallel id/score sequences, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub ids: Vec<String>,
    pub scores: Vec<f64>,
}

impl Ranked {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }
}

impl FromIterator<(String, f64)> for Ranked {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let (ids, scores) = iter.into_iter().unzip();
        Self { ids, scores }
    }
}

/// Newest first; the score is the record's age in days.
pub fn time_rank(timeline: &dyn RecordStore<TimelineEntry>, now_epoch_secs: i64) -> Ranked {
    let mut entries = timeline
        .iterate()
        .map(|(id, entry)| (id, entry.timestamp))
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    entries
        .into_iter()
        .map(|(id, timestamp)| {
            let age_secs = now_epoch_secs.saturating_sub(timestamp).max(0);
            (id.to_string(), age_secs as f64 / SECS_PER_DAY as f64)
        })
        .collect()
}

/// A fresh uniform permutation of every id, all scored zero.
pub fn random_rank<R: Rng + ?Sized>(timeline: &dyn RecordStore<TimelineEntry>, rng: &mut R) -> Ranked {
    let mut ids = timeline
        .iterate()
        .map(|(id, _)| id.to_string())
        .collect::<Vec<_>>();
    ids.shuffle(rng);
    let scores = vec![0.0; ids.len()];
    Ranked { ids, scores }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTokens {
    pub tokens: Vec<String>,
    pub truncated: bool,
}

pub fn tokenize_query(query: &str, max_tokens: usize) -> QueryTokens {
    let sanitized = sanitize_query(query).to_lowercase();
    let mut tokens = sanitized
        .split_whitespace()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let truncated = tokens.len() > max_tokens;
    tokens.truncate(max_tokens);
    QueryTokens { tokens, truncated }
}

fn present(haystack: &str, tokens: &[String]) -> usize {
    tokens.iter().filter(|q| haystack.contains(q.as_str())).count()
}

fn capped(haystack: &str, tokens: &[String]) -> usize {
    tokens
        .iter()
        .map(|q| haystack.matches(q.as_str()).take(SUMMARY_MATCH_CAP).count())
        .sum()
}

/// Weighted field score for one record; `tokens` must already be lowercase.
pub fn score_record(record: &PaperRecord, tokens: &[String]) -> f64 {
    let mut score = 0.0;
    if !record.authors.is_empty() {
        let authors = record.joined_authors(" ").to_lowercase();
        score += AUTHOR_WEIGHT * present(&authors, tokens) as f64;
    }
    if !record.title.is_empty() {
        score += TITLE_WEIGHT * present(&record.title.to_lowercase(), tokens) as f64;
    }
    score += SUMMARY_WEIGHT * capped(&record.summary.to_lowercase(), tokens) as f64;
    score
}

fn by_score_then_id_desc(a: &(String, f64), b: &(String, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0))
}

/// Matching records only, ordered by `(score, id)` descending.
pub fn search_rank(
    corpus: &dyn RecordStore<PaperRecord>,
    query: &str,
    limits: &ShelfRankingConfig,
) -> Ranked {
    let parsed = tokenize_query(query, limits.max_query_tokens);
    if parsed.tokens.is_empty() {
        return Ranked::default();
    }
    if parsed.truncated {
        warn::emit(WarnEvent {
            code: "QUERY_TRUNCATED",
            stage: "rank",
            action: "tokenize-query",
            record: "",
            retry: "none",
            reason: "token-limit",
            err: &format!("kept first {} tokens", limits.max_query_tokens),
        });
    }

    let mut scanned = 0usize;
    let mut pairs = Vec::new();
    for (id, record) in corpus.iterate() {
        if scanned == limits.max_scan_records {
            warn::emit(WarnEvent {
                code: "SCAN_TRUNCATED",
                stage: "rank",
                action: "search-scan",
                record: id,
                retry: "none",
                reason: "scan-limit",
                err: &format!("stopped after {scanned} records"),
            });
            break;
        }
        scanned += 1;

        let score = score_record(record, &parsed.tokens);
        if score > 0.0 {
            pairs.push((id.to_string(), score));
        }
    }

    pairs.sort_by(by_score_then_id_desc);
    pairs.into_iter().collect()
}
