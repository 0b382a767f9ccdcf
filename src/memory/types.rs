//! Core record type definitions.
//!
//! Defines [`LogEntry`] (one line of a memory stream), [`Details`] (its typed payload),
//! [`TailItem`] (a tolerant-read result that may be an unparsed line), and the
//! [`DialogueMessage`] pairs reconstructed for prompting a model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Channel that carries persona conversations.
pub const CHAT_CHANNEL: &str = "chat";

/// Whether an entry records raw input or something derived from it.
///
/// Stored as a plain string. Values other than `event` / `memory` are kept as
/// [`EntryKind::Other`] and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryKind {
    /// Raw input, e.g. a user message or an incoming handshake.
    Event,
    /// A derived or summarized record, e.g. a persona reply.
    Memory,
    Other(String),
}

impl EntryKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Event => "event",
            Self::Memory => "memory",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for EntryKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "event" => Self::Event,
            "memory" => Self::Memory,
            _ => Self::Other(s),
        }
    }
}

impl From<EntryKind> for String {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserialize a field, reading `null` or a value of the wrong shape as the default.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Tags as a list of strings. A lone string counts as one tag; non-string items are skipped.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(tag) => vec![tag],
        _ => Vec::new(),
    })
}

/// Payload of an entry: the message body plus any other fields the writer attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Details {
    /// Full message body. The one key every consumer reads.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Everything else (handshake scope, raw request bodies, fallback markers, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Details {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            extra: Map::new(),
        }
    }

    /// Attach an extra field, replacing any previous value under `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// One immutable record, serialized as a single JSON line of a stream.
///
/// Every field is optional on read, and `null` or oddly shaped values read as the
/// field's default, so older note-style records (`{ts_utc, host, user, source, note,
/// tag}`) and hand-edited lines still parse. Keys this type does not know about land
/// in [`extra`](Self::extra) and are written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp under the `ts` key. Empty for legacy records, whose
    /// `ts_utc` stays in `extra`; see [`ts`](Self::ts).
    #[serde(
        rename = "ts",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "String::is_empty"
    )]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    /// Conversational topic (`"chat"`, `"handshake"`, `"root"`, ...).
    #[serde(default, deserialize_with = "lenient")]
    pub channel: String,
    /// Human user name or persona name.
    #[serde(default, deserialize_with = "lenient")]
    pub author: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient")]
    pub details: Details,
    /// Unknown top-level keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEntry {
    /// Start a new entry stamped with the current UTC time.
    pub fn new(kind: EntryKind, channel: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind: Some(kind),
            channel: channel.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Attach an extra top-level field (e.g. `host`, `source`).
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// When the entry was written: `ts`, else a legacy `ts_utc` or `timestamp` key.
    /// Empty if none is present.
    pub fn ts(&self) -> &str {
        if !self.timestamp.is_empty() {
            return &self.timestamp;
        }
        self.legacy_str("ts_utc")
            .or_else(|| self.legacy_str("timestamp"))
            .unwrap_or("")
    }

    /// Message text: `details.text`, falling back to `summary`. Empty if neither is set.
    pub fn message_text(&self) -> &str {
        match self.details.text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => &self.summary,
        }
    }

    /// Text used for note search: the message text, or a legacy `note` field.
    pub fn note_text(&self) -> &str {
        let text = self.message_text();
        if !text.is_empty() {
            return text;
        }
        self.legacy_str("note").unwrap_or("")
    }

    /// True if `tag` is in `tags` or equals a legacy single `tag` field.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag) || self.legacy_str("tag") == Some(tag)
    }

    /// Legacy single tag, if this is an old note-style record.
    pub fn legacy_tag(&self) -> Option<&str> {
        self.legacy_str("tag")
    }

    /// Where the entry came from: the legacy `source` field, else its author.
    pub fn source(&self) -> &str {
        match self.legacy_str("source") {
            Some(source) => source,
            None if !self.author.is_empty() => &self.author,
            None => "unknown",
        }
    }

    fn legacy_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// One line returned from a tolerant tail read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TailItem {
    Entry(LogEntry),
    /// A line that did not parse as an entry, returned as `{"raw": "..."}`.
    Raw { raw: String },
}

impl TailItem {
    pub fn as_entry(&self) -> Option<&LogEntry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Raw { .. } => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw { .. })
    }
}

/// Speaker of a reconstructed dialogue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{role, content}` pair as handed to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueMessage {
    pub role: Role,
    pub content: String,
}

impl DialogueMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
