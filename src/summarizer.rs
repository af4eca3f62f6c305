//! Summarisation pipeline: extract → prompt → provider → response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::error::ErrorKind;
use crate::extractor::{ExtractError, PdfExtractResult, PdfExtractor};
use crate::provider::{build_provider, Metadata, ProviderError, ProviderRequest};

/// Temperature used when the caller does not choose one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("extraction task failed: {0}")]
    Task(String),
}

impl SummarizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SummarizeError::Extract(e) => e.kind(),
            SummarizeError::Provider(e) => e.kind(),
            SummarizeError::Task(_) => ErrorKind::Unexpected,
        }
    }
}

/// One request to summarise one PDF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub pdf_path: PathBuf,
    /// Provider name, matched case-insensitively
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Required only by providers that need a credential
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl SummaryRequest {
    /// Request with the default temperature and no token cap or credential
    pub fn new(
        pdf_path: impl Into<PathBuf>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            provider: provider.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            api_key: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Metadata attached to every summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    /// Page count of the whole document
    pub pdf_pages: usize,
    pub pdf_metadata: BTreeMap<String, String>,
    pub provider_metadata: Metadata,
}

/// The finished summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub pdf_path: PathBuf,
    pub provider: String,
    pub model: String,
    pub metadata: SummaryMetadata,
}

/// Runs the summarisation pipeline.
///
/// Holds only configuration; every call builds its own provider adapter, so a
/// `Summarizer` can be shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct Summarizer {
    config: Config,
    extractor: PdfExtractor,
}

impl Summarizer {
    pub fn new(config: Config) -> Self {
        let extractor = PdfExtractor::new(config.extractor.page_range);
        Self { config, extractor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Summarise a PDF document using the provider named in the request.
    ///
    /// Any failing step aborts the whole call; nothing is retried.
    pub async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, SummarizeError> {
        info!(
            "Summarizing PDF: {} with provider: {}",
            request.pdf_path.display(),
            request.provider
        );

        let result = self.run(request).await;
        if let Err(e) = &result {
            error!("Error summarizing PDF: {}", e);
        }
        result
    }

    async fn run(&self, request: &SummaryRequest) -> Result<SummaryResponse, SummarizeError> {
        let pdf = self.extract(request.pdf_path.clone()).await?;
        info!("Extracted {} characters from PDF", pdf.text.len());

        let provider = build_provider(&request.provider, request.api_key.as_deref(), &self.config)?;

        let prompt = build_prompt(&pdf);
        let provider_request = ProviderRequest::new(
            prompt,
            request.model.clone(),
            request.temperature,
            request.max_tokens,
        )?;

        info!("Sending request to {}", provider.kind());
        let generated = provider.generate(&provider_request).await?;

        Ok(SummaryResponse {
            summary: generated.text,
            pdf_path: request.pdf_path.clone(),
            provider: request.provider.clone(),
            model: request.model.clone(),
            metadata: SummaryMetadata {
                pdf_pages: pdf.pages,
                pdf_metadata: pdf.metadata,
                provider_metadata: generated.metadata,
            },
        })
    }

    /// Extraction is blocking, so it runs off the async workers.
    async fn extract(&self, path: PathBuf) -> Result<PdfExtractResult, SummarizeError> {
        let extractor = self.extractor.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| SummarizeError::Task(e.to_string()))??;
        Ok(extracted)
    }
}

/// Build the summarisation prompt for an extracted document.
pub fn build_prompt(pdf: &PdfExtractResult) -> String {
    format!(
        r#"
Please summarize the following document in a comprehensive way:

DOCUMENT TITLE: {}
DOCUMENT AUTHOR: {}
DOCUMENT PAGES: {}

DOCUMENT CONTENT:
{}

Please provide a structured summary covering the main points, key findings, and important details.
"#,
        pdf.metadata_value("Title").unwrap_or("Unknown"),
        pdf.metadata_value("Author").unwrap_or("Unknown"),
        pdf.pages,
        pdf.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_result(metadata: &[(&str, &str)]) -> PdfExtractResult {
        PdfExtractResult {
            text: "Revenue grew.\n\nCosts fell.".to_string(),
            path: PathBuf::from("report.pdf"),
            pages: 3,
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn prompt_embeds_document_details() {
        let prompt = build_prompt(&extract_result(&[("Title", "Q1"), ("Author", "Finance")]));
        assert!(prompt.contains("DOCUMENT TITLE: Q1\n"));
        assert!(prompt.contains("DOCUMENT AUTHOR: Finance\n"));
        assert!(prompt.contains("DOCUMENT PAGES: 3\n"));
        assert!(prompt.contains("DOCUMENT CONTENT:\nRevenue grew.\n\nCosts fell.\n"));
        assert!(prompt.trim_end().ends_with(
            "Please provide a structured summary covering the main points, key findings, and important details."
        ));
    }

    #[test]
    fn prompt_defaults_missing_title_and_author() {
        let prompt = build_prompt(&extract_result(&[("Title", "")]));
        assert!(prompt.contains("DOCUMENT TITLE: Unknown\n"));
        assert!(prompt.contains("DOCUMENT AUTHOR: Unknown\n"));
    }

    #[test]
    fn request_builder_defaults() {
        let request = SummaryRequest::new("a.pdf", "ollama", "llama2");
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens, None);
        assert_eq!(request.api_key, None);

        let request = request
            .with_temperature(0.2)
            .with_max_tokens(Some(100))
            .with_api_key(Some("sk".into()));
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.api_key.as_deref(), Some("sk"));
    }

    #[test]
    fn metadata_serializes_three_keys() {
        let metadata = SummaryMetadata {
            pdf_pages: 2,
            pdf_metadata: BTreeMap::new(),
            provider_metadata: Metadata::new(),
        };
        let value = serde_json::to_value(&metadata).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        for key in ["pdf_pages", "pdf_metadata", "provider_metadata"] {
            assert!(keys.contains(&key), "{key}");
        }
    }

    #[tokio::test]
    async fn missing_pdf_fails_before_provider_selection() {
        let summarizer = Summarizer::new(Config::default());
        let request = SummaryRequest::new("/definitely/not/here.pdf", "no-such-provider", "m");
        let err = summarizer.summarize(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
