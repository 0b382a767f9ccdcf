//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionError, CompletionService};
use crate::config::CompletionConfig;
use crate::memory::DialogueMessage;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Chat-completions client for OpenAI or any API that speaks the same shape.
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    /// Pre-computed `"Bearer <key>"` header value.
    auth_header: Option<String>,
    api_key_env: String,
    model: String,
    api_url: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: Option<String>, config: &CompletionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            auth_header: api_key.map(|k| format!("Bearer {k}")),
            api_key_env: config.api_key_env.clone(),
            model: config.model.clone(),
            api_url: config.api_url.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(
        &'a self,
        system: &'a str,
        history: &'a [DialogueMessage],
        message: &'a str,
    ) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: system,
        });
        messages.extend(history.iter().map(|m| ChatMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));
        messages.push(ChatMessage {
            role: "user",
            content: message,
        });
        ChatRequest {
            model: &self.model,
            messages,
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(
        &self,
        system: &str,
        history: &[DialogueMessage],
        message: &str,
    ) -> Result<Option<String>, CompletionError> {
        let auth = self
            .auth_header
            .as_deref()
            .ok_or_else(|| CompletionError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })?;

        let request = self.build_request(system, history, message);
        tracing::debug!(
            model = %self.model,
            history = history.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("response has no choices".into()))?;

        Ok(choice
            .message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(key: Option<&str>) -> OpenAiCompletion {
        OpenAiCompletion::new(key.map(String::from), &CompletionConfig::default())
    }

    #[test]
    fn request_orders_system_history_then_message() {
        let svc = service(Some("k"));
        let history = vec![
            DialogueMessage::user("hi"),
            DialogueMessage::assistant("hello"),
        ];
        let request = svc.build_request("be brief", &history, "how are you?");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-4.1-mini");
        let roles: Vec<&str> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(json["messages"][3]["content"], "how are you?");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let err = service(None).complete("sys", &[], "hi").await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
