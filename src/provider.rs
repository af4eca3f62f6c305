//! Provider port: the one capability every LLM backend implements.
//!
//! A provider turns a [`ProviderRequest`] into a [`ProviderResponse`] with a
//! single outbound call. Adapters live in [`crate::providers`]; this module
//! holds the shared value types and the name-based selection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::Config;
use crate::providers::{OllamaProvider, OpenAiProvider};

/// Free-form provider metadata (token counters, timings, stop reason)
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("{0} API key is required for {0} provider")]
    MissingCredential(ProviderKind),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid response from {provider} API: {message}")]
    InvalidResponse {
        provider: ProviderKind,
        message: String,
    },
    #[error("failed to connect to {provider} API: {message}")]
    Connection {
        provider: ProviderKind,
        message: String,
    },
    #[error("{provider} API returned HTTP {status}: {body}")]
    Api {
        provider: ProviderKind,
        status: u16,
        body: String,
    },
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// The known providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    OpenAi,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Ollama, ProviderKind::OpenAi];

    /// Lowercase name used on the command line and in forms
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Whether the provider needs an API key
    pub fn requires_credential(&self) -> bool {
        matches!(self, ProviderKind::OpenAi)
    }

    /// Model suggested when the user does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "llama2",
            ProviderKind::OpenAi => "gpt-3.5-turbo",
        }
    }

    /// A few model names to show alongside the default
    pub fn example_models(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "llama2, mistral, gemma, etc.",
            ProviderKind::OpenAi => "gpt-3.5-turbo, gpt-4, etc.",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "Ollama"),
            ProviderKind::OpenAi => write!(f, "OpenAI"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(ProviderError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// A prompt ready to be sent to a provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    prompt: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ProviderRequest {
    /// Fails when the prompt is blank.
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<Self, ProviderError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ProviderError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(Self {
            prompt,
            model: model.into(),
            temperature,
            max_tokens,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }
}

/// Generated text plus whatever the provider reported about the call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: String,
    /// The model named in the request
    pub model: String,
    pub metadata: Metadata,
}

/// An LLM backend reachable over the network.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Issue exactly one request; no retries and no streaming.
    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

/// Construct the adapter named by `provider`.
///
/// `api_key` is only consulted for providers that need one; a blank key counts
/// as missing.
pub fn build_provider(
    provider: &str,
    api_key: Option<&str>,
    config: &Config,
) -> Result<Box<dyn LlmProvider>, ProviderError> {
    let kind: ProviderKind = provider.parse()?;

    match kind {
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(config.ollama.clone())?)),
        ProviderKind::OpenAi => {
            let api_key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or(ProviderError::MissingCredential(kind))?;
            let mut openai = config.openai.clone();
            openai.api_key = Some(api_key.to_string());
            Ok(Box::new(OpenAiProvider::new(openai)?))
        }
    }
}
