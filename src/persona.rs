//! The two reply-generating identities and how their replies are produced and recorded.

use std::sync::Arc;

use serde::Serialize;

use crate::completion::CompletionService;
use crate::config::{HabitatConfig, PersonaConfig};
use crate::memory::types::CHAT_CHANNEL;
use crate::memory::{AppendOptions, DialogueMessage, Details, EntryKind, EventLog, LogEntry};

/// Tag added to reply entries that did not come from the model.
pub const FALLBACK_TAG: &str = "fallback";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Cipher,
    Vexis,
}

impl Persona {
    pub const ALL: [Persona; 2] = [Persona::Cipher, Persona::Vexis];

    /// Display name, also used as the author of reply entries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cipher => "Cipher",
            Self::Vexis => "Vexis",
        }
    }

    /// Tag that marks this persona's chat entries.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Cipher => "cipher",
            Self::Vexis => "vexis",
        }
    }

    pub fn system_prompt<'a>(&self, prompts: &'a PersonaConfig) -> &'a str {
        match self {
            Self::Cipher => &prompts.cipher_prompt,
            Self::Vexis => &prompts.vexis_prompt,
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cipher" => Ok(Self::Cipher),
            "vexis" => Ok(Self::Vexis),
            _ => Err(format!("unknown persona: {s}")),
        }
    }
}

/// The stream files of a habitat: the root stream (Cipher, CLI notes) and Vexis's own.
#[derive(Debug, Clone)]
pub struct Streams {
    root: EventLog,
    vexis: EventLog,
}

impl Streams {
    pub fn new(root: EventLog, vexis: EventLog) -> Self {
        Self { root, vexis }
    }

    pub fn from_config(config: &HabitatConfig) -> Self {
        let options: AppendOptions = config.append_options();
        Self {
            root: EventLog::new(config.root_stream_path()).with_options(options),
            vexis: EventLog::new(config.vexis_stream_path()).with_options(options),
        }
    }

    pub fn root(&self) -> &EventLog {
        &self.root
    }

    pub fn vexis(&self) -> &EventLog {
        &self.vexis
    }

    pub fn for_persona(&self, persona: Persona) -> &EventLog {
        match persona {
            Persona::Cipher => &self.root,
            Persona::Vexis => &self.vexis,
        }
    }
}

/// A persona's answer. `fallback` is set when the text did not come from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub fallback: bool,
}

/// Produces persona replies through the completion service, or a local stub when none
/// is configured.
#[derive(Clone)]
pub struct Brain {
    completion: Option<Arc<dyn CompletionService>>,
    prompts: PersonaConfig,
    max_turns: usize,
}

impl Brain {
    pub fn new(
        completion: Option<Arc<dyn CompletionService>>,
        prompts: PersonaConfig,
        max_turns: usize,
    ) -> Self {
        Self {
            completion,
            prompts,
            max_turns,
        }
    }

    /// Turns of prior dialogue handed to the model.
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Ask `persona` to answer `message` from `user`, with `history` as context.
    ///
    /// Never fails: a completion error becomes a fallback reply that names the error.
    pub async fn reply(
        &self,
        persona: Persona,
        history: &[DialogueMessage],
        user: &str,
        message: &str,
    ) -> Reply {
        let Some(ref service) = self.completion else {
            return Reply {
                text: format!("(local {persona} stub) {}", heard(persona, user, message)),
                fallback: true,
            };
        };

        let system = persona.system_prompt(&self.prompts);
        match service.complete(system, history, message).await {
            Ok(Some(text)) => Reply {
                text,
                fallback: false,
            },
            Ok(None) => Reply {
                text: format!("({persona}) I received: {message}"),
                fallback: false,
            },
            Err(e) => {
                tracing::warn!(persona = %persona, error = %e, "completion failed, using fallback");
                Reply {
                    text: format!(
                        "(fallback {persona} stub) {} [model error: {e}]",
                        heard(persona, user, message)
                    ),
                    fallback: true,
                }
            }
        }
    }
}

fn heard(persona: Persona, user: &str, message: &str) -> String {
    match persona {
        Persona::Cipher => format!("Hey {user}, I heard: {message}"),
        Persona::Vexis => format!("I heard: {message}"),
    }
}

/// Entry recording a user's chat message to `persona`.
pub fn user_message_entry(persona: Persona, user: &str, message: &str) -> LogEntry {
    LogEntry::new(EntryKind::Event, CHAT_CHANNEL, user)
        .tags(["chat", persona.tag(), "user"])
        .summary(format!("Chat from {user} to {persona}"))
        .details(Details::text(message))
}

/// Entry recording `persona`'s reply to `user`. Fallback replies carry [`FALLBACK_TAG`].
pub fn reply_entry(persona: Persona, user: &str, reply: &Reply) -> LogEntry {
    let mut tags = vec!["chat", persona.tag(), "reply"];
    let mut details = Details::text(reply.text.clone());
    if reply.fallback {
        tags.push(FALLBACK_TAG);
        details = details.with("fallback", true);
    }
    LogEntry::new(EntryKind::Memory, CHAT_CHANNEL, persona.name())
        .tags(tags)
        .summary(format!("{persona} reply to {user}"))
        .details(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use async_trait::async_trait;

    struct Fixed(Result<Option<String>, ()>);

    #[async_trait]
    impl CompletionService for Fixed {
        async fn complete(
            &self,
            _system: &str,
            _history: &[DialogueMessage],
            _message: &str,
        ) -> Result<Option<String>, CompletionError> {
            self.0
                .clone()
                .map_err(|()| CompletionError::Malformed("boom".into()))
        }
    }

    fn brain(result: Result<Option<String>, ()>) -> Brain {
        Brain::new(Some(Arc::new(Fixed(result))), PersonaConfig::default(), 6)
    }

    #[test]
    fn persona_parses_case_insensitively() {
        assert_eq!("Cipher".parse::<Persona>().unwrap(), Persona::Cipher);
        assert_eq!("VEXIS".parse::<Persona>().unwrap(), Persona::Vexis);
        assert!("echo".parse::<Persona>().is_err());
    }

    #[tokio::test]
    async fn model_reply_is_not_fallback() {
        let reply = brain(Ok(Some("hello Ann".into())))
            .reply(Persona::Cipher, &[], "Ann", "hi")
            .await;
        assert_eq!(
            reply,
            Reply {
                text: "hello Ann".into(),
                fallback: false
            }
        );
    }

    #[tokio::test]
    async fn empty_model_reply_echoes_message() {
        let reply = brain(Ok(None)).reply(Persona::Vexis, &[], "Ann", "hi").await;
        assert_eq!(reply.text, "(Vexis) I received: hi");
        assert!(!reply.fallback);
    }

    #[tokio::test]
    async fn model_error_becomes_tagged_fallback() {
        let reply = brain(Err(())).reply(Persona::Cipher, &[], "Ann", "hi").await;
        assert!(reply.fallback);
        assert!(reply.text.starts_with("(fallback Cipher stub) Hey Ann, I heard: hi"));
        assert!(reply.text.contains("[model error: malformed response: boom]"));

        let entry = reply_entry(Persona::Cipher, "Ann", &reply);
        assert!(entry.has_tag(FALLBACK_TAG));
        assert_eq!(entry.details.extra["fallback"], true);
    }

    #[tokio::test]
    async fn disabled_completion_uses_local_stub() {
        let brain = Brain::new(None, PersonaConfig::default(), 6);
        let reply = brain.reply(Persona::Vexis, &[], "Ann", "status?").await;
        assert_eq!(reply.text, "(local Vexis stub) I heard: status?");
        assert!(reply.fallback);
    }

    #[test]
    fn conversation_entries_have_expected_shape() {
        let user = user_message_entry(Persona::Vexis, "Ann", "hi");
        assert_eq!(user.kind, Some(EntryKind::Event));
        assert_eq!(user.channel, "chat");
        assert_eq!(user.author, "Ann");
        assert_eq!(user.tags, vec!["chat", "vexis", "user"]);
        assert_eq!(user.summary, "Chat from Ann to Vexis");

        let reply = Reply {
            text: "hey".into(),
            fallback: false,
        };
        let entry = reply_entry(Persona::Vexis, "Ann", &reply);
        assert_eq!(entry.kind, Some(EntryKind::Memory));
        assert_eq!(entry.author, "Vexis");
        assert_eq!(entry.tags, vec!["chat", "vexis", "reply"]);
        assert!(entry.details.extra.is_empty());
    }
}
