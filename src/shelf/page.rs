use crate::shelf::rank::Ranked;
use crate::shelf::record::TimelineEntry;
use crate::shelf::store::RecordStore;
use crate::shelf::util::SECS_PER_DAY;
use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyWindow {
    Days(i64),
    /// A filter value that could not be used; every record passes.
    Unbounded,
}

/// Resolve the raw recency filter.
///
/// `None` means no filter was requested. Values that do not parse as a
/// non-negative integer, or whose window overflows, become `Unbounded`.
pub fn parse_recency_window(raw: Option<&str>) -> Option<RecencyWindow> {
    let trimmed = raw.map(str::trim).filter(|v| !v.is_empty())?;
    let window = match trimmed.parse::<i64>() {
        Ok(days) if days >= 0 && days.checked_mul(SECS_PER_DAY).is_some() => {
            RecencyWindow::Days(days)
        }
        _ => RecencyWindow::Unbounded,
    };
    Some(window)
}

/// 1-based page number; anything unparsable or below one is page 1.
pub fn parse_page_number(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.max(1))
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(1)
}

/// Keep records newer than `now - days`, preserving order and scores.
/// Ids the timeline does not know are dropped.
pub fn filter_recent(
    ranked: Ranked,
    timeline: &dyn RecordStore<TimelineEntry>,
    days: i64,
    now_epoch_secs: i64,
) -> Ranked {
    let window = days.saturating_mul(SECS_PER_DAY);
    let cutoff = now_epoch_secs.saturating_sub(window);
    ranked
        .ids
        .into_iter()
        .zip(ranked.scores)
        .filter(|(id, _)| {
            timeline
                .get(id)
                .is_some_and(|entry| entry.timestamp > cutoff)
        })
        .collect()
}

pub fn paginate(ranked: Ranked, page_number: usize) -> Ranked {
    let page_number = page_number.max(1);
    let start = (page_number - 1).saturating_mul(PAGE_SIZE);
    if start >= ranked.len() {
        return Ranked::default();
    }
    let end = start.saturating_add(PAGE_SIZE).min(ranked.len());
    Ranked {
        ids: ranked.ids[start..end].to_vec(),
        scores: ranked.scores[start..end].to_vec(),
    }
}

/// Recency filter (when bounded) followed by pagination.
pub fn apply(
    ranked: Ranked,
    timeline: &dyn RecordStore<TimelineEntry>,
    recency: Option<RecencyWindow>,
    page_number: usize,
    now_epoch_secs: i64,
) -> Ranked {
    let filtered = match recency {
        Some(RecencyWindow::Days(days)) => filter_recent(ranked, timeline, days, now_epoch_secs),
        Some(RecencyWindow::Unbounded) | None => ranked,
    };
    paginate(filtered, page_number)
}
