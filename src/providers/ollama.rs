//! Adapter for a local Ollama server (`POST /api/generate`, non-streaming).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::{create_client, endpoint};
use crate::config::OllamaConfig;
use crate::provider::{
    LlmProvider, Metadata, ProviderError, ProviderKind, ProviderRequest, ProviderResponse,
};

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    option: GenerateOptions,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    max_tokens: Option<u32>,
    temperature: f32,
}

/// Ollama API response format. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    response: Option<String>,
    model: Option<String>,
    total_duration: Option<u64>,
    load_duration: Option<u64>,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
    eval_duration: Option<u64>,
}

pub struct OllamaProvider {
    config: OllamaConfig,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Result<Self, ProviderError> {
        let client = create_client(config.timeout())?;
        info!("Initialized Ollama adapter with base URL: {}", config.base_url);
        Ok(Self { config, client })
    }

    fn connection_error(e: impl std::fmt::Display) -> ProviderError {
        error!("Connection error with Ollama API: {}", e);
        ProviderError::Connection {
            provider: ProviderKind::Ollama,
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        info!("Sending request to Ollama with model: {}", request.model());

        let body = GenerateRequest {
            model: request.model(),
            prompt: request.prompt(),
            option: GenerateOptions {
                max_tokens: request.max_tokens(),
                temperature: request.temperature(),
            },
            stream: false,
            max_tokens: request.max_tokens(),
        };

        let url = endpoint(&self.config.base_url, "api/generate");
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::connection_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!("Ollama API returned HTTP {}", status);
            return Err(ProviderError::Api {
                provider: ProviderKind::Ollama,
                status: status.as_u16(),
                body,
            });
        }

        let raw = resp.text().await.map_err(Self::connection_error)?;
        debug!("Received {} bytes from Ollama", raw.len());

        let parsed: GenerateResponse = serde_json::from_str(&raw).map_err(|e| {
            error!("Invalid JSON response from Ollama API: {}", e);
            ProviderError::InvalidResponse {
                provider: ProviderKind::Ollama,
                message: e.to_string(),
            }
        })?;

        let metadata = parsed.metadata(request.model());
        Ok(ProviderResponse {
            text: parsed.response.unwrap_or_default(),
            model: request.model().to_string(),
            metadata,
        })
    }
}

impl GenerateResponse {
    fn metadata(&self, requested_model: &str) -> Metadata {
        let mut metadata = Metadata::new();
        let model = self.model.as_deref().unwrap_or(requested_model);
        metadata.insert("model_name".into(), Value::from(model));

        let counters = [
            ("total_duration", self.total_duration),
            ("load_duration", self.load_duration),
            ("prompt_eval_count", self.prompt_eval_count),
            ("eval_count", self.eval_count),
            ("eval_duration", self.eval_duration),
        ];
        for (key, value) in counters {
            metadata.insert(key.into(), Value::from(value.unwrap_or(0)));
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_duplicates_max_tokens_when_set() {
        let body = GenerateRequest {
            model: "llama2",
            prompt: "hi",
            option: GenerateOptions {
                max_tokens: Some(256),
                temperature: 0.5,
            },
            stream: false,
            max_tokens: Some(256),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "llama2",
                "prompt": "hi",
                "option": {"max_tokens": 256, "temperature": 0.5},
                "stream": false,
                "max_tokens": 256,
            })
        );
    }

    #[test]
    fn request_body_omits_top_level_max_tokens_when_unset() {
        let body = GenerateRequest {
            model: "llama2",
            prompt: "hi",
            option: GenerateOptions {
                max_tokens: None,
                temperature: 0.5,
            },
            stream: false,
            max_tokens: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("max_tokens").is_none());
        assert_eq!(value["option"]["max_tokens"], Value::Null);
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"response": "ok"}"#).unwrap();
        let metadata = parsed.metadata("mistral");
        assert_eq!(metadata["model_name"], "mistral");
        for key in [
            "total_duration",
            "load_duration",
            "prompt_eval_count",
            "eval_count",
            "eval_duration",
        ] {
            assert_eq!(metadata[key], 0, "{key}");
        }
    }

    #[test]
    fn reported_counters_are_kept() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"response": "ok", "model": "llama2:7b", "total_duration": 900, "eval_count": 42, "prompt_eval_count": null}"#,
        )
        .unwrap();
        let metadata = parsed.metadata("llama2");
        assert_eq!(metadata["model_name"], "llama2:7b");
        assert_eq!(metadata["total_duration"], 900);
        assert_eq!(metadata["eval_count"], 42);
        assert_eq!(metadata["prompt_eval_count"], 0);
    }
}
