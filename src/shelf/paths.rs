use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ShelfPaths {
    pub shelf_home: PathBuf,
    pub corpus_db: PathBuf,
    pub timeline_db: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<ShelfPaths> {
    let shelf_home = match env::var("PAPERSHELF_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join("papershelf"),
    };

    let corpus_db = env_or_default_path("PAPERSHELF_CORPUS_DB", shelf_home.join("db/papers.jsonl"));
    let timeline_db =
        env_or_default_path("PAPERSHELF_TIMELINE_DB", shelf_home.join("db/metas.jsonl"));
    let logs_dir = env_or_default_path("PAPERSHELF_LOGS_DIR", shelf_home.join("logs"));

    Ok(ShelfPaths {
        shelf_home,
        corpus_db,
        timeline_db,
        logs_dir,
    })
}

#[cfg(test)]
pub fn test_paths(root: &std::path::Path) -> ShelfPaths {
    ShelfPaths {
        shelf_home: root.join("shelf"),
        corpus_db: root.join("shelf/db/papers.jsonl"),
        timeline_db: root.join("shelf/db/metas.jsonl"),
        logs_dir: root.join("shelf/logs"),
    }
}
