use axum::extract::Multipart;
use std::path::Path;

use super::error::ApiError;
use crate::console::has_pdf_extension;
use crate::summarizer::DEFAULT_TEMPERATURE;

/// An uploaded file with its name and contents.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        has_pdf_extension(Path::new(&self.filename))
    }
}

/// Parsed form fields from the multipart upload.
pub struct FormFields {
    pub file: UploadedFile,
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub openai_api_key: Option<String>,
}

/// Parse a multipart form upload into structured form fields.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<FormFields, ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut provider: Option<String> = None;
    let mut model: Option<String> = None;
    let mut temperature = DEFAULT_TEMPERATURE;
    let mut max_tokens: Option<u32> = None;
    let mut openai_api_key: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file data: {}", e)))?
                    .to_vec();
                file = Some(UploadedFile { filename, data });
            }
            "provider" | "model" | "temperature" | "max_tokens" | "openai_api_key" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read {}: {}", name, e)))?;
                let val = val.trim().to_string();
                if val.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "provider" => provider = Some(val),
                    "model" => model = Some(val),
                    "temperature" => temperature = parse_number(&name, &val)?,
                    "max_tokens" => max_tokens = Some(parse_number(&name, &val)?),
                    _ => openai_api_key = Some(val),
                }
            }
            _ => {
                // Unknown fields are drained and ignored
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read {}: {}", name, e)))?;
            }
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let provider = provider.ok_or_else(|| missing("provider"))?;
    let model = model.ok_or_else(|| missing("model"))?;

    Ok(FormFields {
        file,
        provider,
        model,
        temperature,
        max_tokens,
        openai_api_key,
    })
}

fn missing(field: &str) -> ApiError {
    ApiError::bad_request(format!("Missing required field: {}", field))
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid value for {}: {}", field, value)))
}
