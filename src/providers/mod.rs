//! Provider adapters, one per wire protocol.

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::{OpenAiProvider, SYSTEM_PROMPT};

use reqwest::Client;
use std::time::Duration;

/// User-Agent string sent to every provider
const USER_AGENT: &str = concat!(
    "summa-pdf/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/summa-pdf)"
);

/// Create a configured HTTP client for provider calls
fn create_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// Join a base URL and an endpoint path without doubling the slash
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
