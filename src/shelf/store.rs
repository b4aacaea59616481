//! Append-only JSON Lines key-value store.
//!
//! Each `set` appends one `{"key": .., "doc": ..}` line; opening a store
//! replays the file so the last line for a key wins. Writers hold an
//! exclusive advisory lock on `<file>.lock` for the lifetime of the handle.
//! Readers never lock: they replay whatever complete lines exist and ignore a
//! torn final line left by a writer that is still appending. A new writer
//! trims that line before its first append. Any other unparsable line is
//! skipped with a warning and dropped by the next compaction.

use crate::error::ShelfError;
use crate::shelf::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Snapshot an existing store; missing files are an error.
    Read,
    /// Create the store if absent and accept writes.
    Create,
}

/// The operations the ingestion and ranking paths need from a store.
pub trait RecordStore<T> {
    fn get(&self, key: &str) -> Option<&T>;
    fn set(&mut self, key: &str, doc: T) -> Result<()>;
    fn iterate(&self) -> Box<dyn Iterator<Item = (&str, &T)> + '_>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize)]
struct LineOut<'a, T> {
    key: &'a str,
    doc: &'a T,
}

#[derive(Deserialize)]
struct LineIn<T> {
    key: String,
    doc: T,
}

#[derive(Debug)]
pub struct JsonlStore<T> {
    path: PathBuf,
    mode: OpenMode,
    entries: BTreeMap<String, T>,
    replayed_lines: usize,
    corrupt_lines: usize,
    /// File length after the last complete append.
    end: u64,
    writer: Option<File>,
    lock: Option<File>,
}

pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Whether some process currently holds the writer lock for `path`.
pub fn writer_active(path: &Path) -> Result<bool> {
    let lock_path = lock_path_for(path);
    if !lock_path.exists() {
        return Ok(false);
    }
    let lock = File::open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    if lock.try_lock_shared().is_err() {
        return Ok(true);
    }
    lock.unlock()
        .with_context(|| format!("failed to unlock {}", lock_path.display()))?;
    Ok(false)
}

/// State of the last line after a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    Clean,
    /// The final line parsed but has no trailing newline yet.
    MissingNewline,
    /// The final line is incomplete; its bytes start at this offset.
    Torn(u64),
}

struct Replayed<T> {
    entries: BTreeMap<String, T>,
    lines: usize,
    corrupt: usize,
    tail: Tail,
}

fn replay<T: DeserializeOwned>(path: &Path) -> Result<Replayed<T>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let complete = raw.is_empty() || raw.ends_with('\n');
    let lines = raw.lines().collect::<Vec<_>>();
    let last = lines.len().saturating_sub(1);

    let mut entries = BTreeMap::new();
    let mut replayed = 0usize;
    let mut corrupt = 0usize;
    let mut tail = if complete { Tail::Clean } else { Tail::MissingNewline };
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<LineIn<T>>(trimmed) {
            Ok(entry) => {
                entries.insert(entry.key, entry.doc);
                replayed += 1;
            }
            Err(_) if idx == last && !complete => {
                let start = raw.rfind('\n').map(|i| i + 1).unwrap_or(0);
                tail = Tail::Torn(start as u64);
                break;
            }
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "CORRUPT_LINE",
                    stage: "store",
                    action: "replay",
                    record: &path.display().to_string(),
                    retry: "run-compact",
                    reason: "unparsable-line",
                    err: &format!("line {}: {err}", idx + 1),
                });
                corrupt += 1;
            }
        }
    }
    Ok(Replayed {
        entries,
        lines: replayed,
        corrupt,
        tail,
    })
}

impl<T: Serialize + DeserializeOwned> JsonlStore<T> {
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self> {
        match mode {
            OpenMode::Read => Self::open_read(path),
            OpenMode::Create => Self::open_create(path),
        }
    }

    fn open_read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ShelfError::StoreUnavailable(format!(
                "{} does not exist (run `papershelf ingest` first)",
                path.display()
            ))
            .into());
        }
        let replayed = replay(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            mode: OpenMode::Read,
            entries: replayed.entries,
            replayed_lines: replayed.lines,
            corrupt_lines: replayed.corrupt,
            end: 0,
            writer: None,
            lock: None,
        })
    }

    fn open_create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                ShelfError::StoreUnavailable(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        let lock_path = lock_path_for(path);
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|err| {
                ShelfError::StoreUnavailable(format!(
                    "failed to open {}: {err}",
                    lock_path.display()
                ))
            })?;
        lock.try_lock_exclusive()
            .map_err(|_| ShelfError::StoreLocked(path.display().to_string()))?;

        let replayed = if path.exists() {
            replay(path)?
        } else {
            Replayed {
                entries: BTreeMap::new(),
                lines: 0,
                corrupt: 0,
                tail: Tail::Clean,
            }
        };

        let mut writer = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                ShelfError::StoreUnavailable(format!("failed to open {}: {err}", path.display()))
            })?;

        // Appends must start on a fresh line.
        match replayed.tail {
            Tail::Clean => {}
            Tail::MissingNewline => writer
                .write_all(b"\n")
                .with_context(|| format!("failed to terminate {}", path.display()))?,
            Tail::Torn(offset) => writer
                .set_len(offset)
                .with_context(|| format!("failed to trim torn tail of {}", path.display()))?,
        }
        let end = writer
            .metadata()
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            mode: OpenMode::Create,
            entries: replayed.entries,
            replayed_lines: replayed.lines,
            corrupt_lines: replayed.corrupt,
            end,
            writer: Some(writer),
            lock: Some(lock),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines in the file that are shadowed by a later write of the same key.
    pub fn shadowed_lines(&self) -> usize {
        self.replayed_lines.saturating_sub(self.entries.len())
    }

    /// Unparsable lines skipped while replaying.
    pub fn corrupt_lines(&self) -> usize {
        self.corrupt_lines
    }

    /// Rewrite the file with one line per live key.
    pub fn compact(&mut self) -> Result<usize> {
        if self.mode != OpenMode::Create {
            anyhow::bail!("cannot compact {} opened read-only", self.path.display());
        }
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        {
            let mut out = BufWriter::new(tmp.as_file());
            for (key, doc) in &self.entries {
                serde_json::to_writer(&mut out, &LineOut { key, doc })?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        // The old append handle points at the replaced inode.
        let writer = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to reopen {}", self.path.display()))?;
        self.end = writer
            .metadata()
            .with_context(|| format!("failed to stat {}", self.path.display()))?
            .len();
        self.writer = Some(writer);
        self.replayed_lines = self.entries.len();
        self.corrupt_lines = 0;
        Ok(self.entries.len())
    }

    /// Flush pending writes and release the writer lock.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .sync_all()
                .with_context(|| format!("failed to sync {}", self.path.display()))?;
        }
        if let Some(lock) = self.lock.take() {
            lock.unlock()
                .with_context(|| format!("failed to unlock {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl<T> Drop for JsonlStore<T> {
    fn drop(&mut self) {
        self.writer.take();
        if let Some(lock) = self.lock.take() {
            let _ = lock.unlock();
        }
    }
}

impl<T: Serialize + DeserializeOwned> RecordStore<T> for JsonlStore<T> {
    fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, doc: T) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            anyhow::bail!("{} is opened read-only", self.path.display());
        };
        let mut line = serde_json::to_string(&LineOut { key, doc: &doc })?;
        line.push('\n');

        // Bytes past `end` are left over from an append that failed part way.
        let on_disk = writer
            .metadata()
            .with_context(|| format!("failed to stat {}", self.path.display()))?
            .len();
        if on_disk > self.end {
            writer
                .set_len(self.end)
                .with_context(|| format!("failed to trim {}", self.path.display()))?;
        }
        if let Err(err) = writer.write_all(line.as_bytes()) {
            let _ = writer.set_len(self.end);
            return Err(err).with_context(|| format!("failed to append to {}", self.path.display()));
        }
        self.end += line.len() as u64;
        self.entries.insert(key.to_string(), doc);
        self.replayed_lines += 1;
        Ok(())
    }

    fn iterate(&self) -> Box<dyn Iterator<Item = (&str, &T)> + '_> {
        Box::new(self.entries.iter().map(|(k, v)| (k.as_str(), v)))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
