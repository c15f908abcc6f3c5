//! Saving the activity log to disk.

use crate::model::{now_local, LogEntry, LogKind};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

#[derive(Debug, Serialize)]
struct SavedEntry<'a> {
    timestamp: String,
    kind: LogKind,
    text: &'a str,
}

/// Directory saved logs go to, under the platform's local data dir.
pub fn logs_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("no local data directory on this platform")?;
    Ok(base.join("compose-toggle").join("logs"))
}

/// Clock time shown in front of each entry.
pub fn entry_clock(entry: &LogEntry) -> String {
    entry
        .at
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

/// Plain-text rendering: a clock prefix per entry followed by its text.
pub fn format_log_text(entries: &[LogEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("[{}] ", entry_clock(entry)));
        out.push_str(entry.text.trim_end_matches('\n'));
        out.push('\n');
    }
    out
}

pub fn write_log_json(path: &Path, entries: &[LogEntry]) -> Result<()> {
    let saved: Vec<SavedEntry<'_>> = entries
        .iter()
        .map(|e| SavedEntry {
            timestamp: e.at.format(&Rfc3339).unwrap_or_default(),
            kind: e.kind,
            text: &e.text,
        })
        .collect();
    let json = serde_json::to_string_pretty(&saved).context("serialize log")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Save the log as JSON into `logs_dir()` under a time-stamped name.
pub fn save_log_json(entries: &[LogEntry]) -> Result<PathBuf> {
    let stamp = now_local()
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("format file name timestamp")?;
    let path = logs_dir()?.join(format!("session-{stamp}.json"));
    write_log_json(&path, entries)?;
    Ok(path)
}
