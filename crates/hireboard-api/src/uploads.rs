//! Multipart file field handling.

use axum::extract::multipart::Field;

use crate::error::ApiError;

/// Upper bound on a single uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted resume content types.
pub const RESUME_CONTENT_TYPES: &[&str] = &["application/pdf"];

/// Accepted image content types (photos, logos).
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// A file read out of a multipart field.
#[derive(Debug)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

/// Read and validate one multipart file field.
pub async fn read_file_field(
    field: Field<'_>,
    allowed_types: &[&str],
) -> Result<UploadedFile, ApiError> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::validation("File field is missing a content type"))?;

    if !allowed_types.contains(&content_type.as_str()) {
        return Err(ApiError::validation(format!(
            "Unsupported file type '{}'; allowed: {}",
            content_type,
            allowed_types.join(", ")
        )));
    }

    let file_name = field.file_name().map(|s| s.to_string());

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(format!("Failed to read file upload: {}", e)))?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::validation(format!(
            "File exceeds the {} MB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    if bytes.is_empty() {
        return Err(ApiError::validation("Uploaded file is empty"));
    }

    Ok(UploadedFile {
        bytes: bytes.to_vec(),
        content_type,
        file_name,
    })
}

/// Read a text multipart field.
pub async fn read_text_field(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("Failed to read form field: {}", e)))
}
