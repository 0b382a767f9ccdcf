pub mod append;
pub mod search;
pub mod snapshot;
pub mod tail;

use anyhow::Result;
use clap::ValueEnum;

use habitat::config::HabitatConfig;
use habitat::memory::{AppendOptions, EventLog, LogEntry, TailItem};

/// Which stream a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamName {
    Root,
    Vexis,
}

/// Open the named stream with the configured append options.
pub fn open_stream(config: &HabitatConfig, name: StreamName) -> EventLog {
    let path = match name {
        StreamName::Root => config.root_stream_path(),
        StreamName::Vexis => config.vexis_stream_path(),
    };
    let options: AppendOptions = config.append_options();
    EventLog::new(path).with_options(options)
}

/// One terminal line for an entry: `[ts] [tag] (source) text`.
pub fn format_entry(entry: &LogEntry) -> String {
    let ts = match entry.ts() {
        "" => "?",
        ts => ts,
    };
    let tag = entry
        .legacy_tag()
        .map(str::to_string)
        .or_else(|| (!entry.tags.is_empty()).then(|| entry.tags.join(",")));
    match tag {
        Some(tag) => format!("[{ts}] [{tag}] ({}) {}", entry.source(), entry.note_text()),
        None => format!("[{ts}] ({}) {}", entry.source(), entry.note_text()),
    }
}

pub fn format_item(item: &TailItem) -> String {
    match item {
        TailItem::Entry(entry) => format_entry(entry),
        TailItem::Raw { raw } => format!("RAW: {raw}"),
    }
}

/// Print a liveness record for the habitat.
pub fn probe(config: &HabitatConfig) -> Result<()> {
    let payload = serde_json::json!({
        "ts_utc": chrono::Utc::now().to_rfc3339(),
        "host": habitat::host::hostname(),
        "user": habitat::host::username(),
        "status": "ok",
        "echo_root": config.resolved_root().display().to_string(),
    });
    println!("{payload}");
    Ok(())
}
