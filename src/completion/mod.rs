//! External completion service.
//!
//! Provides the [`CompletionService`] trait (system prompt + history + message in, one
//! reply out) and an OpenAI-compatible HTTP implementation. The service is created via
//! [`create_service`] from configuration.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::DialogueMessage;

/// Why a completion call failed. Callers turn every variant into a fallback reply.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API key configured (set {env_var})")]
    MissingApiKey { env_var: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// A hosted model that produces one text reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete `message` given the persona's `system` prompt and prior `history`.
    ///
    /// `Ok(None)` means the model answered with no content.
    async fn complete(
        &self,
        system: &str,
        history: &[DialogueMessage],
        message: &str,
    ) -> Result<Option<String>, CompletionError>;
}

/// Create the completion service from config.
///
/// Returns `None` when completion is disabled; personas then answer with a local stub.
pub fn create_service(
    config: &crate::config::HabitatConfig,
) -> Option<Box<dyn CompletionService>> {
    if !config.completion.enabled {
        tracing::info!("completion disabled, personas will use local stub replies");
        return None;
    }
    let service = openai::OpenAiCompletion::new(
        config.resolved_api_key(),
        &config.completion,
    );
    tracing::info!(
        model = %config.completion.model,
        url = %config.completion.api_url,
        "completion service ready"
    );
    Some(Box::new(service))
}
