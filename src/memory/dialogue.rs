//! Chat-history reconstruction.
//!
//! Turns the chat entries of a stream back into the role-tagged transcript a persona
//! sees as context.

use crate::memory::store::{EventLog, LogError, MAX_TAIL_LIMIT};
use crate::memory::types::{DialogueMessage, LogEntry, Role, CHAT_CHANNEL};

impl EventLog {
    /// Rebuild the recent dialogue between `requester` and the persona tagged
    /// `persona_tag`.
    ///
    /// Scans the last [`MAX_TAIL_LIMIT`] lines, keeps chat-channel entries carrying the
    /// persona tag and a non-empty text, and returns at most `2 * max_turns` messages
    /// (the newest ones, oldest first).
    pub fn dialogue_window(
        &self,
        persona_tag: &str,
        requester: &str,
        max_turns: usize,
    ) -> Result<Vec<DialogueMessage>, LogError> {
        let entries = self.tail_entries(MAX_TAIL_LIMIT)?;
        Ok(build_dialogue(&entries, persona_tag, requester, max_turns))
    }
}

/// Pure half of [`EventLog::dialogue_window`], over entries already read.
pub fn build_dialogue(
    entries: &[LogEntry],
    persona_tag: &str,
    requester: &str,
    max_turns: usize,
) -> Vec<DialogueMessage> {
    let mut dialogue: Vec<DialogueMessage> = entries
        .iter()
        .filter(|e| e.channel == CHAT_CHANNEL && e.tags.iter().any(|t| t == persona_tag))
        .filter_map(|e| {
            let text = e.message_text();
            if text.is_empty() {
                return None;
            }
            let role = if e.author == requester {
                Role::User
            } else {
                Role::Assistant
            };
            Some(DialogueMessage {
                role,
                content: text.to_string(),
            })
        })
        .collect();

    let max_messages = max_turns.saturating_mul(2);
    if dialogue.len() > max_messages {
        dialogue.drain(..dialogue.len() - max_messages);
    }
    dialogue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::{Details, EntryKind};

    fn chat(author: &str, tag: &str, text: &str) -> LogEntry {
        LogEntry::new(EntryKind::Event, CHAT_CHANNEL, author)
            .tags(["chat", tag])
            .details(Details::text(text))
    }

    #[test]
    fn other_channels_and_personas_are_ignored() {
        let entries = vec![
            chat("Ann", "cipher", "hi"),
            chat("Ann", "vexis", "wrong persona"),
            LogEntry::new(EntryKind::Memory, "root", "Ann")
                .tags(["cipher"])
                .details(Details::text("wrong channel")),
            chat("Cipher", "cipher", "hello Ann"),
        ];

        let dialogue = build_dialogue(&entries, "cipher", "Ann", 6);
        assert_eq!(
            dialogue,
            vec![DialogueMessage::user("hi"), DialogueMessage::assistant("hello Ann")]
        );
    }

    #[test]
    fn summary_is_used_when_text_missing_and_empty_entries_dropped() {
        let entries = vec![
            LogEntry::new(EntryKind::Event, CHAT_CHANNEL, "Ann")
                .tags(["cipher"])
                .summary("from summary"),
            LogEntry::new(EntryKind::Event, CHAT_CHANNEL, "Ann").tags(["cipher"]),
            LogEntry::new(EntryKind::Event, CHAT_CHANNEL, "Ann")
                .tags(["cipher"])
                .details(Details::text("")),
        ];

        let dialogue = build_dialogue(&entries, "cipher", "Ann", 6);
        assert_eq!(dialogue, vec![DialogueMessage::user("from summary")]);
    }

    #[test]
    fn window_keeps_newest_messages() {
        let entries: Vec<LogEntry> = (0..10)
            .map(|i| chat(if i % 2 == 0 { "Ann" } else { "Cipher" }, "cipher", &i.to_string()))
            .collect();

        let dialogue = build_dialogue(&entries, "cipher", "Ann", 2);
        let contents: Vec<&str> = dialogue.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["6", "7", "8", "9"]);
    }

    #[test]
    fn zero_turns_yields_nothing() {
        let entries = vec![chat("Ann", "cipher", "hi")];
        assert!(build_dialogue(&entries, "cipher", "Ann", 0).is_empty());
    }
}
