//! Interactive console flow.
//!
//! Prompts for a PDF, a provider, a model and (for providers that need one)
//! an API key, then prints the summary and its metadata.

use colored::Colorize;
use dialoguer::{Input, Password};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::provider::ProviderKind;
use crate::summarizer::{SummarizeError, Summarizer, SummaryRequest, SummaryResponse, DEFAULT_TEMPERATURE};

const RULE_WIDTH: usize = 80;

/// Run one prompt → summarise → display cycle.
///
/// Summarisation failures are rendered and reported as `Ok(None)`; only
/// terminal I/O failures are returned as errors.
pub async fn run(summarizer: &Summarizer) -> Result<Option<SummaryResponse>, dialoguer::Error> {
    println!("{}", welcome_banner());

    let request = prompt_request()?;
    info!(
        "Received request for PDF: {} with provider: {}",
        request.pdf_path.display(),
        request.provider
    );

    println!("\nSummarising {} ...", request.pdf_path.display());
    match summarizer.summarize(&request).await {
        Ok(response) => {
            println!("{}", render_summary(&response));
            Ok(Some(response))
        }
        Err(e) => {
            error!("Error in console flow: {}", e);
            eprintln!("{}", render_error(&e));
            Ok(None)
        }
    }
}

/// Collect every field of a [`SummaryRequest`] from the terminal.
pub fn prompt_request() -> Result<SummaryRequest, dialoguer::Error> {
    let pdf_path = prompt_pdf_path()?;
    let provider = prompt_provider()?;

    println!("Available {} models: {}", provider, provider.example_models());
    let model: String = Input::new()
        .with_prompt("Enter model name")
        .default(provider.default_model().to_string())
        .interact_text()?;

    let api_key = if provider.requires_credential() {
        prompt_api_key(provider)?
    } else {
        None
    };

    debug!("Selected provider: {}, model: {}", provider.as_str(), model);
    Ok(SummaryRequest::new(pdf_path, provider.as_str(), model.trim())
        .with_temperature(DEFAULT_TEMPERATURE)
        .with_api_key(api_key))
}

fn prompt_pdf_path() -> Result<PathBuf, dialoguer::Error> {
    let input: String = Input::new()
        .with_prompt("Enter the path to the PDF file")
        .validate_with(|input: &String| resolve_pdf_path(input).map(|_| ()))
        .interact_text()?;

    // Validated above; the file may still vanish before the pipeline reads it.
    let path = resolve_pdf_path(&input).unwrap_or_else(|_| PathBuf::from(input.trim()));
    debug!("Selected PDF path: {}", path.display());
    Ok(path)
}

fn prompt_provider() -> Result<ProviderKind, dialoguer::Error> {
    let names: Vec<&str> = ProviderKind::ALL.iter().map(|p| p.as_str()).collect();
    let input: String = Input::new()
        .with_prompt(format!("Select LLM provider ({})", names.join("/")))
        .validate_with(|input: &String| parse_provider_choice(input).map(|_| ()))
        .interact_text()?;

    Ok(parse_provider_choice(&input).unwrap_or(ProviderKind::Ollama))
}

/// Ask for the key, asking a second time if the first answer is blank.
fn prompt_api_key(provider: ProviderKind) -> Result<Option<String>, dialoguer::Error> {
    let prompt = format!("Enter your {} API key", provider);
    for attempt in 0..2 {
        let key = Password::new()
            .with_prompt(prompt.as_str())
            .allow_empty_password(true)
            .interact()?;
        let key = key.trim();
        if !key.is_empty() {
            return Ok(Some(key.to_string()));
        }
        if attempt == 0 {
            println!("API key is required for {}. Please try again.", provider);
        }
    }
    Ok(None)
}

/// Turn user input into an absolute path to an existing `.pdf` file.
pub fn resolve_pdf_path(input: &str) -> Result<PathBuf, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Path cannot be empty. Please try again.".to_string());
    }

    let path = std::path::absolute(Path::new(trimmed)).unwrap_or_else(|_| PathBuf::from(trimmed));

    if !path.is_file() {
        return Err(format!(
            "File not found: {}. Please enter a valid path to a PDF file.",
            path.display()
        ));
    }

    if !has_pdf_extension(&path) {
        return Err(format!(
            "File is not a PDF: {}. Please enter a path to a PDF file.",
            path.display()
        ));
    }

    Ok(path)
}

/// Case-insensitive `.pdf` suffix check
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Accept only the exact provider names, ignoring case and whitespace.
pub fn parse_provider_choice(input: &str) -> Result<ProviderKind, String> {
    input.parse::<ProviderKind>().map_err(|_| {
        let names: Vec<String> = ProviderKind::ALL
            .iter()
            .map(|p| format!("'{}'", p.as_str()))
            .collect();
        format!("Invalid provider. Please enter {}.", names.join(" or "))
    })
}

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

pub fn welcome_banner() -> String {
    let rule = rule('=');
    format!(
        "{rule}\n{}\n{rule}\n\
         This application summarizes PDF documents using LLM technology.\n\
         You will be prompted to provide a PDF path and choose an LLM provider.\n\
         {rule}",
        "PDF SUMMARIZER".bold()
    )
}

/// Format a summary followed by its metadata block.
pub fn render_summary(response: &SummaryResponse) -> String {
    let rule = rule('=');
    let metadata = &response.metadata;
    let mut out = String::new();

    let _ = writeln!(out, "\n{rule}\n{}\n{rule}", "SUMMARY".bold().green());
    let _ = writeln!(out, "{}", response.summary);
    let _ = writeln!(out, "\n{rule}\n{}\n{rule}", "METADATA".bold().cyan());
    let _ = writeln!(out, "PDF Pages: {}", metadata.pdf_pages);

    let _ = writeln!(out, "PDF Metadata:");
    for (key, value) in &metadata.pdf_metadata {
        let _ = writeln!(out, "  {}: {}", key, value);
    }

    let _ = writeln!(out, "Provider Metadata:");
    for (key, value) in &metadata.provider_metadata {
        let _ = writeln!(out, "  {}: {}", key, display_value(value));
    }

    out.push_str(&rule);
    out
}

/// Format a failure as an ERROR block.
pub fn render_error(err: &SummarizeError) -> String {
    let rule = rule('!');
    format!(
        "\n{rule}\n{} ({})\n{rule}\n{}\n{rule}",
        "ERROR".bold().red(),
        err.kind(),
        err
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
