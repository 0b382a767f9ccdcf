//! Append-only JSONL stream: write path and tail reads.
//!
//! [`EventLog`] wraps one stream file. Every call is a complete open/write/close (or
//! open/read/close) cycle; no handle is held between calls and nothing is cached, so any
//! number of `EventLog` values (or processes) may point at the same file.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::memory::types::{LogEntry, TailItem};

/// Upper bound on how many lines a single tail read returns.
pub const MAX_TAIL_LIMIT: usize = 200;

const BOM: char = '\u{feff}';

/// Errors from stream operations. Missing files and malformed lines are not errors.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl LogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// How appends touch the file beyond a plain append-mode write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOptions {
    /// Hold an exclusive advisory lock on the file while writing.
    pub lock: bool,
    /// `fsync` the data before closing.
    pub sync: bool,
}

/// One append-only stream file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    options: AppendOptions,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: AppendOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AppendOptions) -> Self {
        self.options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single line.
    ///
    /// Creates parent directories and the file if needed. The whole line (including the
    /// terminator) goes out in one `write_all` so concurrent appenders interleave at line
    /// granularity wherever the platform makes append-mode writes atomic.
    pub fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LogError::io(parent, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LogError::io(&self.path, e))?;

        if self.options.lock {
            file.lock().map_err(|e| LogError::io(&self.path, e))?;
        }

        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| LogError::io(&self.path, e))?;

        if self.options.sync {
            file.sync_data().map_err(|e| LogError::io(&self.path, e))?;
        }

        tracing::debug!(path = %self.path.display(), bytes = line.len(), "entry appended");
        Ok(())
    }

    /// Last `limit` lines, oldest first. Lines that fail to parse come back as
    /// [`TailItem::Raw`].
    ///
    /// `limit` is clamped to `1..=`[`MAX_TAIL_LIMIT`].
    pub fn tail(&self, limit: usize) -> Result<Vec<TailItem>, LogError> {
        let text = self.read_text()?;
        Ok(tail_lines(&text, clamp_limit(limit))
            .map(|line| match parse_line(line) {
                Some(entry) => TailItem::Entry(entry),
                None => TailItem::Raw {
                    raw: line.to_string(),
                },
            })
            .collect())
    }

    /// Last `limit` lines, oldest first, with unparseable lines dropped.
    ///
    /// The window is taken before parsing, so a malformed line still uses up a slot.
    pub fn tail_entries(&self, limit: usize) -> Result<Vec<LogEntry>, LogError> {
        let text = self.read_text()?;
        Ok(tail_lines(&text, clamp_limit(limit))
            .filter_map(parse_line)
            .collect())
    }

    /// Every parseable entry in the stream, in file order.
    pub fn entries(&self) -> Result<Vec<LogEntry>, LogError> {
        let text = self.read_text()?;
        Ok(lines(&text).filter_map(parse_line).collect())
    }

    /// Whole stream as text. A missing file reads as empty; invalid UTF-8 is replaced.
    fn read_text(&self) -> Result<String, LogError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(LogError::io(&self.path, e)),
        }
    }
}

pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_TAIL_LIMIT)
}

/// Non-blank lines with any leading BOM removed.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim_start_matches(BOM))
        .filter(|line| !line.trim().is_empty())
}

fn tail_lines(text: &str, limit: usize) -> impl Iterator<Item = &str> {
    let all: Vec<&str> = lines(text).collect();
    let start = all.len().saturating_sub(limit);
    all.into_iter().skip(start)
}

fn parse_line(line: &str) -> Option<LogEntry> {
    match serde_json::from_str(line) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed stream line");
            None
        }
    }
}
