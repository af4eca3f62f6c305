//! Adapter for the OpenAI chat-completion API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::{create_client, endpoint};
use crate::config::OpenAiConfig;
use crate::provider::{
    LlmProvider, Metadata, ProviderError, ProviderKind, ProviderRequest, ProviderResponse,
};

/// Fixed system instruction sent ahead of every prompt
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Output cap used when the caller does not set one
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Counters may be absent or `null`; both read as zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

pub struct OpenAiProvider {
    config: OpenAiConfig,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    /// Fails without touching the network when no API key is configured.
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                error!("OpenAI API key is not set");
                ProviderError::MissingCredential(ProviderKind::OpenAi)
            })?;

        let client = create_client(config.timeout())?;
        info!("Initialized OpenAI adapter");
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn connection_error(e: impl std::fmt::Display) -> ProviderError {
        error!("Connection error with OpenAI API: {}", e);
        ProviderError::Connection {
            provider: ProviderKind::OpenAi,
            message: e.to_string(),
        }
    }

    fn invalid_response(message: impl Into<String>) -> ProviderError {
        let message = message.into();
        error!("Invalid response from OpenAI API: {}", message);
        ProviderError::InvalidResponse {
            provider: ProviderKind::OpenAi,
            message,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        info!("Sending request to OpenAI with model: {}", request.model());

        let body = chat_request(request);

        let url = endpoint(&self.config.base_url, "chat/completions");
        let mut builder = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        if let Some(org) = &self.config.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let resp = builder.send().await.map_err(Self::connection_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!("OpenAI API returned HTTP {}", status);
            return Err(ProviderError::Api {
                provider: ProviderKind::OpenAi,
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text().await.map_err(Self::connection_error)?;
        debug!("Received {} bytes from OpenAI", raw.len());

        let parsed: ChatResponse =
            serde_json::from_str(&raw).map_err(|e| Self::invalid_response(e.to_string()))?;

        into_provider_response(parsed, request.model())
            .ok_or_else(|| Self::invalid_response("No choices in OpenAI response"))
    }
}

fn chat_request(request: &ProviderRequest) -> ChatRequest<'_> {
    ChatRequest {
        model: request.model(),
        messages: [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: request.prompt(),
            },
        ],
        temperature: request.temperature(),
        max_tokens: request.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
    }
}

/// `None` when the completion carries no choices.
fn into_provider_response(parsed: ChatResponse, requested_model: &str) -> Option<ProviderResponse> {
    let choice = parsed.choices.unwrap_or_default().into_iter().next()?;
    let usage = parsed.usage.unwrap_or_default();

    let mut metadata = Metadata::new();
    metadata.insert(
        "model_name".into(),
        Value::from(parsed.model.as_deref().unwrap_or(requested_model)),
    );
    metadata.insert(
        "prompt_tokens".into(),
        Value::from(usage.prompt_tokens.unwrap_or(0)),
    );
    metadata.insert(
        "completion_tokens".into(),
        Value::from(usage.completion_tokens.unwrap_or(0)),
    );
    metadata.insert(
        "total_tokens".into(),
        Value::from(usage.total_tokens.unwrap_or(0)),
    );
    metadata.insert(
        "finish_reason".into(),
        choice.finish_reason.map(Value::from).unwrap_or(Value::Null),
    );

    Some(ProviderResponse {
        text: choice.message.and_then(|m| m.content).unwrap_or_default(),
        model: requested_model.to_string(),
        metadata,
    })
}
