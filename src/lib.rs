//! # Summa PDF
//!
//! Summarise PDF documents with a local or cloud LLM.
//!
//! ## Features
//!
//! - **Text extraction**: page text and Info metadata via lopdf and pdf-extract
//! - **Provider Agnostic**: Ollama (local server) and OpenAI (chat completions)
//!   behind one `LlmProvider` trait, selected by name
//! - **Two front ends**: an interactive console flow and an axum HTTP endpoint

pub mod config;
pub mod console;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod provider;
pub mod providers;
pub mod server;
pub mod summarizer;

pub use config::Config;
pub use error::ErrorKind;
pub use extractor::{PageRange, PdfExtractResult, PdfExtractor};
pub use provider::{LlmProvider, ProviderKind, ProviderRequest, ProviderResponse};
pub use summarizer::{Summarizer, SummaryRequest, SummaryResponse};
