//! CLI `append` command: write one note to a stream and echo it back.

use anyhow::{bail, Context, Result};

use super::{open_stream, StreamName};
use habitat::config::HabitatConfig;
use habitat::memory::{Details, EntryKind, LogEntry};

const SOURCE: &str = "habitat append";

/// Append `words` (joined with spaces) as a note, optionally tagged.
pub fn append(
    config: &HabitatConfig,
    stream: StreamName,
    tag: Option<&str>,
    words: &[String],
) -> Result<()> {
    let note = words.join(" ").trim().to_string();
    if note.is_empty() {
        bail!("empty note text");
    }
    let tag = match tag.map(str::trim) {
        Some("") => bail!("empty tag"),
        other => other,
    };

    let entry = build_note(config, &note, tag);
    let log = open_stream(config, stream);
    log.append(&entry)
        .with_context(|| format!("failed to append to {}", log.path().display()))?;

    println!("{}", serde_json::to_string(&entry)?);
    Ok(())
}

fn build_note(config: &HabitatConfig, note: &str, tag: Option<&str>) -> LogEntry {
    let author = habitat::host::username().unwrap_or_else(|| config.chat.default_user.clone());
    let mut entry = LogEntry::new(EntryKind::Memory, "root", author)
        .tags(tag)
        .summary(note)
        .details(Details::text(note))
        .with_extra("source", SOURCE);
    if let Some(host) = habitat::host::hostname() {
        entry = entry.with_extra("host", host);
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_carries_tag_and_source() {
        let config = HabitatConfig::default();
        let entry = build_note(&config, "Nexus online", Some("Echo"));
        assert_eq!(entry.tags, vec!["Echo"]);
        assert_eq!(entry.note_text(), "Nexus online");
        assert_eq!(entry.source(), SOURCE);
        assert!(entry.has_tag("Echo"));

        let untagged = build_note(&config, "plain", None);
        assert!(untagged.tags.is_empty());
    }

    #[test]
    fn empty_note_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = HabitatConfig::default();
        config.storage.root_dir = tmp.path().display().to_string();

        let err = append(&config, StreamName::Root, None, &["  ".into()]).unwrap_err();
        assert!(err.to_string().contains("empty note"));
        assert!(!config.root_stream_path().exists());
    }

    #[test]
    fn empty_tag_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = HabitatConfig::default();
        config.storage.root_dir = tmp.path().display().to_string();

        let err = append(&config, StreamName::Root, Some(" "), &["hi".into()]).unwrap_err();
        assert!(err.to_string().contains("empty tag"));
    }
}
