#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use habitat::completion::{CompletionError, CompletionService};
use habitat::config::HabitatConfig;
use habitat::memory::types::CHAT_CHANNEL;
use habitat::memory::{DialogueMessage, Details, EntryKind, EventLog, LogEntry};
use tempfile::TempDir;

/// A stream path inside a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn temp_stream() -> (TempDir, EventLog) {
    let tmp = TempDir::new().unwrap();
    let log = EventLog::new(tmp.path().join("streams").join("root_memory.jsonl"));
    (tmp, log)
}

/// Config rooted at `root`, with completion turned off.
pub fn test_config(root: &std::path::Path) -> HabitatConfig {
    let mut config = HabitatConfig::default();
    config.storage.root_dir = root.display().to_string();
    config.completion.enabled = false;
    config
}

/// A note-style entry on the root channel.
pub fn note(text: &str, tags: &[&str]) -> LogEntry {
    LogEntry::new(EntryKind::Memory, "root", "tester")
        .tags(tags.iter().copied())
        .summary(text)
        .details(Details::text(text))
}

/// A chat entry as the server would write it.
pub fn chat(author: &str, persona_tag: &str, text: &str) -> LogEntry {
    LogEntry::new(EntryKind::Event, CHAT_CHANNEL, author)
        .tags(["chat", persona_tag])
        .details(Details::text(text))
}

/// Write raw lines straight to the stream file, bypassing `EventLog::append`.
pub fn write_raw(path: &std::path::Path, content: &str) -> PathBuf {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
    path.to_path_buf()
}

/// Completion service with a canned answer that records what it was asked.
pub struct MockCompletion {
    pub answer: Result<Option<String>, String>,
    pub calls: Mutex<Vec<(String, Vec<DialogueMessage>, String)>>,
}

impl MockCompletion {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(Some(text.to_string())),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(
        &self,
        system: &str,
        history: &[DialogueMessage],
        message: &str,
    ) -> Result<Option<String>, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), history.to_vec(), message.to_string()));
        self.answer
            .clone()
            .map_err(|m| CompletionError::Status {
                status: 500,
                message: m,
            })
    }
}
