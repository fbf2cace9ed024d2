//! Leaderboard module - JSON-backed run history
//!
//! Finished runs land in a small JSON file next to the binary. Loading is
//! forgiving: a missing or corrupt file reads as an empty board rather
//! than an error, so a bad write never bricks the game.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Entries kept on disk, best first.
const MAX_ENTRIES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub character: String,
    pub stage: u32,
    pub score: u32,
    pub victory: bool,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl Entry {
    pub fn now(character: &str, stage: u32, score: u32, victory: bool) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            character: character.to_string(),
            stage,
            score,
            victory,
            timestamp,
        }
    }
}

/// Load the leaderboard. Missing or unparsable files read as empty.
pub fn load(path: &Path) -> Vec<Entry> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Vec::new();
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

/// Insert an entry, keep the best runs, write back.
pub fn record(path: &Path, entry: Entry) -> Result<()> {
    let mut entries = load(path);
    entries.push(entry);
    entries.sort_by(|a, b| {
        (b.victory, b.stage, b.score).cmp(&(a.victory, a.stage, a.score))
    });
    entries.truncate(MAX_ENTRIES);
    let raw = serde_json::to_string_pretty(&entries).context("serializing leaderboard")?;
    fs::write(path, raw).with_context(|| format!("writing leaderboard to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("cardfall-leaderboard-{name}-{}", std::process::id()));
        path
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let path = temp_path("missing");
        assert!(load(&path).is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        assert!(load(&path).is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_record_sorts_best_first() {
        let path = temp_path("sort");
        let _ = fs::remove_file(&path);
        record(&path, Entry::now("cowboy", 3, 1200, false)).unwrap();
        record(&path, Entry::now("hunter", 10, 240_000, true)).unwrap();
        record(&path, Entry::now("superman", 5, 900, false)).unwrap();

        let entries = load(&path);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].victory);
        assert_eq!(entries[1].stage, 5);
        assert_eq!(entries[2].stage, 3);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_record_caps_entry_count() {
        let path = temp_path("cap");
        let _ = fs::remove_file(&path);
        for i in 0..60 {
            record(&path, Entry::now("cowboy", 1, i, false)).unwrap();
        }
        assert_eq!(load(&path).len(), MAX_ENTRIES);
        let _ = fs::remove_file(&path);
    }
}
