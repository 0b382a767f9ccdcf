//! Append-only memory streams.
//!
//! - [`store`]: the [`EventLog`] write path and tolerant/strict tail reads
//! - [`dialogue`]: chat-history reconstruction for persona prompts
//! - [`search`]: note/tag search and profile snapshots
//! - [`types`]: the [`LogEntry`] record and friends

pub mod dialogue;
pub mod search;
pub mod store;
pub mod types;

pub use store::{AppendOptions, EventLog, LogError, MAX_TAIL_LIMIT};
pub use types::{DialogueMessage, Details, EntryKind, LogEntry, Role, TailItem};
