use crate::shelf::config::ShelfConfig;
use crate::shelf::page::{self, PAGE_SIZE, RecencyWindow, parse_page_number, parse_recency_window};
use crate::shelf::paths::ShelfPaths;
use crate::shelf::rank::{RankMode, Ranked, random_rank, search_rank, time_rank};
use crate::shelf::record::{PaperRecord, PaperView, TimelineEntry};
use crate::shelf::store::{JsonlStore, OpenMode, RecordStore};
use crate::shelf::util::now_epoch_secs;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Raw request strings as the presentation layer receives them.
#[derive(Debug, Clone, Default)]
pub struct RawRankRequest<'a> {
    pub rank: Option<&'a str>,
    pub query: Option<&'a str>,
    pub time_filter: Option<&'a str>,
    pub page_number: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRequest {
    pub mode: RankMode,
    pub query: String,
    /// Echoed back verbatim so the caller can redisplay it.
    pub time_filter: String,
    pub recency: Option<RecencyWindow>,
    pub page_number: usize,
}

/// A non-empty query always means search; otherwise an unknown or missing
/// mode means time.
pub fn resolve_request(raw: &RawRankRequest<'_>) -> RankRequest {
    let query = raw.query.unwrap_or_default().to_string();
    let mode = if !query.is_empty() {
        RankMode::Search
    } else {
        raw.rank.and_then(RankMode::parse).unwrap_or(RankMode::Time)
    };

    RankRequest {
        mode,
        query,
        time_filter: raw.time_filter.unwrap_or_default().to_string(),
        recency: parse_recency_window(raw.time_filter),
        page_number: parse_page_number(raw.page_number),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub rank: String,
    pub time_filter: String,
    pub search_query: String,
    pub page_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPage {
    pub gvars: PageContext,
    pub page_size: usize,
    pub ids: Vec<String>,
    pub scores: Vec<f64>,
    pub papers: Vec<PaperView>,
}

pub fn rank(
    request: &RankRequest,
    corpus: &dyn RecordStore<PaperRecord>,
    timeline: &dyn RecordStore<TimelineEntry>,
    cfg: &ShelfConfig,
    now: i64,
) -> Ranked {
    match request.mode {
        RankMode::Search => search_rank(corpus, &request.query, &cfg.ranking),
        RankMode::Time => time_rank(timeline, now),
        RankMode::Random => random_rank(timeline, &mut rand::thread_rng()),
    }
}

pub fn render_page(
    request: &RankRequest,
    page: Ranked,
    corpus: &dyn RecordStore<PaperRecord>,
    timeline: &dyn RecordStore<TimelineEntry>,
) -> RankedPage {
    let papers = page
        .pairs()
        .filter_map(|(id, weight)| match corpus.get(id) {
            Some(record) => Some(PaperView::from_record(record, weight)),
            None => timeline
                .get(id)
                .map(|entry| PaperView::from_timeline(entry, weight)),
        })
        .collect();

    RankedPage {
        gvars: PageContext {
            rank: request.mode.as_str().to_string(),
            time_filter: request.time_filter.clone(),
            search_query: request.query.clone(),
            page_number: request.page_number.to_string(),
        },
        page_size: PAGE_SIZE,
        ids: page.ids,
        scores: page.scores,
        papers,
    }
}

/// Serve one request. Store handles live only for the duration of this call
/// and are released on every return path.
pub fn handle(paths: &ShelfPaths, cfg: &ShelfConfig, request: &RankRequest) -> Result<RankedPage> {
    let corpus = JsonlStore::<PaperRecord>::open(&paths.corpus_db, OpenMode::Read)?;
    let timeline = JsonlStore::<TimelineEntry>::open(&paths.timeline_db, OpenMode::Read)?;
    let now = now_epoch_secs()?;

    let ranked = rank(request, &corpus, &timeline, cfg, now);
    let page = page::apply(
        ranked,
        &timeline,
        request.recency,
        request.page_number,
        now,
    );
    Ok(render_page(request, page, &corpus, &timeline))
}
