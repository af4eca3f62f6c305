use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{error, info};

use super::error::ApiError;
use super::upload;
use super::AppState;
use crate::summarizer::{SummaryMetadata, SummaryRequest};

const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Body returned by `POST /api/summarize`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub summary: String,
    /// Name of the uploaded file, not the temporary path
    pub filename: String,
    pub provider: String,
    pub model: String,
    pub metadata: SummaryMetadata,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "PDF Summarizer API",
        "version": API_VERSION,
        "documentation": "/api",
        "api_endpoints": "/api",
    }))
}

pub async fn api_root() -> Json<Value> {
    Json(json!({
        "message": "PDF Summarizer API",
        "version": API_VERSION,
        "endpoints": {
            "/api/summarize": "POST - Summarize a PDF document",
        },
    }))
}

pub async fn summarize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse>, ApiError> {
    let form = upload::parse_multipart(multipart).await?;
    info!("Received request to summarize PDF: {}", form.file.filename);

    if !form.file.is_pdf() {
        error!("Uploaded file is not a PDF: {}", form.file.filename);
        return Err(ApiError::bad_request("Uploaded file must be a PDF"));
    }

    // Removed when dropped, on every return path below
    let upload_dir = state.summarizer.config().server.upload_dir.as_deref();
    let temp_file = write_temp_pdf(&form.file.data, upload_dir)?;

    let api_key = form
        .openai_api_key
        .or_else(|| state.summarizer.config().openai.api_key.clone());

    let request = SummaryRequest::new(temp_file.path(), form.provider, form.model)
        .with_temperature(form.temperature)
        .with_max_tokens(form.max_tokens)
        .with_api_key(api_key);

    let response = state.summarizer.summarize(&request).await?;
    info!("Successfully summarized PDF: {}", form.file.filename);

    Ok(Json(ApiResponse {
        summary: response.summary,
        filename: form.file.filename,
        provider: response.provider,
        model: response.model,
        metadata: response.metadata,
    }))
}

fn write_temp_pdf(data: &[u8], dir: Option<&Path>) -> Result<NamedTempFile, ApiError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("summa-upload-").suffix(".pdf");
    let file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    };
    let mut file = file
        .map_err(|e| ApiError::internal(format!("Failed to create temp file: {}", e)))?;
    file.write_all(data)
        .and_then(|_| file.flush())
        .map_err(|e| ApiError::internal(format!("Failed to write temp file: {}", e)))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_pdf_holds_upload_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_temp_pdf(b"%PDF-1.4 body", Some(dir.path())).unwrap();
        let path = file.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 body");

        drop(file);
        assert!(!path.exists());
    }
}
