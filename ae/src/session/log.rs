//! Session log
//!
//! Every logged chat line is buffered as `{sender, content, timestamp}` and
//! written at session end as one pretty JSON array per session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::agent::ChatMessage;

/// Timestamp format stored in each record
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// File stem format for session log files
pub const FILE_STEM_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One logged chat line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Display name of the sender
    pub sender: String,
    pub content: String,
    pub timestamp: String,
}

/// Append-only buffer of chat lines for one session
#[derive(Debug, Default)]
pub struct SessionLog {
    records: Vec<LogRecord>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a message with the current local time
    pub fn record(&mut self, message: &ChatMessage) {
        self.records.push(LogRecord {
            sender: message.sender.display_name.clone(),
            content: message.text.clone(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        });
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the buffer to `<dir>/<YYYYmmdd_HHMMSS>.json` and clear it
    ///
    /// Nothing is written when the buffer is empty.
    pub fn save(&mut self, dir: &Path) -> io::Result<Option<PathBuf>> {
        debug!(?dir, record_count = self.records.len(), "SessionLog::save: called");
        if self.records.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(dir)?;
        let stem = Local::now().format(FILE_STEM_FORMAT).to_string();
        let mut path = dir.join(format!("{}.json", stem));
        let mut suffix = 1;
        while path.exists() {
            path = dir.join(format!("{}_{}.json", stem, suffix));
            suffix += 1;
        }

        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&path, json)?;
        info!(path = %path.display(), records = self.records.len(), "Saved session log");

        self.records.clear();
        Ok(Some(path))
    }
}

/// Read a saved session log
pub fn read_session_log(path: &Path) -> Result<Vec<LogRecord>> {
    debug!(?path, "read_session_log: called");
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Failed to parse {}", path.display()))
}

/// Saved session logs in `dir`, oldest first
pub fn list_session_logs(dir: &Path) -> Result<Vec<PathBuf>> {
    debug!(?dir, "list_session_logs: called");
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let logs = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    Ok(logs)
}
