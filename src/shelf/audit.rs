use crate::shelf::paths::ShelfPaths;
use crate::shelf::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at_epoch_secs: i64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(paths: &ShelfPaths, phase: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = paths.logs_dir.join("audit.log");
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::paths::test_paths;
    use tempfile::tempdir;

    #[test]
    fn append_event_writes_one_json_line_per_call() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        append_event(&paths, "ingest", "ok", "upserted=2 failed=0").expect("first");
        append_event(&paths, "compact", "ok", "corpus=2").expect("second");

        let raw = fs::read_to_string(paths.logs_dir.join("audit.log")).expect("read audit");
        let events = raw
            .lines()
            .map(|line| serde_json::from_str::<AuditEvent>(line).expect("parse"))
            .collect::<Vec<_>>();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].phase, "ingest");
        assert_eq!(events[1].message, "corpus=2");
    }
}
