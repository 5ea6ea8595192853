use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the activity log (`~/.codeagent/activity.jsonl`).
///
/// One line is appended per user action, from the dashboard or the CLI.
/// `codeagent activity` reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    /// Action name, e.g. `"analyze"` or `"apply-actions"`.
    pub action: String,
    #[serde(default = "default_true")]
    pub success: bool,
    /// User-facing failure message.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    pub latency_ms: u64,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Where activity is recorded. Writes are best-effort: a failed append never
/// fails the action it describes.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// `~/.codeagent/activity.jsonl`, or disabled when `enabled` is false or
    /// no home directory can be resolved.
    pub fn from_config(enabled: bool) -> Self {
        match activity_log_path() {
            Some(path) if enabled => Self::at(path),
            _ => Self::disabled(),
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn record(&self, action: &str, error: Option<&str>, latency: Duration) {
        let entry = ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            action: action.to_string(),
            success: error.is_none(),
            error: error.map(str::to_string),
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
        };
        let _ = self.append(&entry);
    }

    /// Read every entry. Malformed lines are skipped; a missing file reads
    /// as empty.
    pub fn read_all(&self) -> Vec<ActivityEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        let reader = BufReader::new(file);
        reader
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActivityEntry>(&line).ok())
            .collect()
    }

    /// The last `limit` entries, oldest first.
    pub fn read_recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut entries = self.read_all();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries
    }

    fn append(&self, entry: &ActivityEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

/// Return the path to the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".codeagent").join("activity.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_appends_one_line_per_action() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::at(dir.path().join("logs").join("activity.jsonl"));

        log.record("analyze", None, Duration::from_millis(120));
        log.record("ingest", Some("Please provide path"), Duration::ZERO);

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "analyze");
        assert!(entries[0].success);
        assert_eq!(entries[0].latency_ms, 120);
        assert!(!entries[1].success);
        assert_eq!(entries[1].error.as_deref(), Some("Please provide path"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        fs::write(
            &path,
            "not json\n{\"timestamp\":\"t\",\"action\":\"health\",\"latency_ms\":3}\n",
        )
        .unwrap();

        let entries = ActivityLog::at(&path).read_all();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].success);
    }

    #[test]
    fn read_recent_keeps_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::at(dir.path().join("activity.jsonl"));
        for action in ["a", "b", "c"] {
            log.record(action, None, Duration::ZERO);
        }

        let recent: Vec<_> = log.read_recent(2).into_iter().map(|e| e.action).collect();
        assert_eq!(recent, vec!["b", "c"]);
        assert_eq!(log.read_recent(10).len(), 3);
    }

    #[test]
    fn disabled_log_records_nothing() {
        let log = ActivityLog::disabled();
        log.record("analyze", None, Duration::ZERO);
        assert!(log.read_all().is_empty());
        assert!(log.path().is_none());
    }
}
