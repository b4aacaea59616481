use anyhow::{Context, Result};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SECS_PER_DAY: i64 = 60 * 60 * 24;

/// Return the current Unix epoch in seconds.
///
/// Every ranking and filtering path reads the clock through here so that a
/// single request sees one consistent "now".
pub fn now_epoch_secs() -> Result<i64> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?
        .as_secs();
    i64::try_from(secs).context("system clock is out of range")
}

/// Truncate `input` to at most `max_chars` Unicode characters, stripping
/// control characters and appending `…` when truncated.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    let clean: String = input.chars().filter(|c| !c.is_control()).collect();
    if clean.chars().count() > max_chars {
        let mut s: String = clean.chars().take(max_chars).collect();
        s.push('…');
        s
    } else {
        clean
    }
}
