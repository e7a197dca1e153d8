//! PDF text extraction for uploaded study material.
//!
//! Uploads are checked for the PDF signature and the size limit before the
//! bytes are handed to `pdf-extract`. A document that parses but yields only
//! whitespace (typically a scanned, image-only PDF) is rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ExtractError;

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// An uploaded document and the text pulled out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub id: Uuid,
    pub name: String,
    /// Upload size in bytes.
    pub size: usize,
    pub extracted_text: String,
}

/// Validates an upload and extracts its text.
///
/// # Arguments
///
/// * `name` - Original file name, used in errors and for display
/// * `bytes` - Raw file contents
///
/// # Errors
///
/// `TooLarge` over [`MAX_UPLOAD_BYTES`], `NotPdf` without the PDF signature,
/// `ParseFailed` when the PDF cannot be read and `NoText` when it holds no
/// extractable text.
pub fn extract_text(name: &str, bytes: &[u8]) -> Result<UploadedDocument, ExtractError> {
    validate_upload(name, bytes)?;

    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::ParseFailed {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    into_document(name, bytes.len(), text)
}

/// Reads a PDF from disk and extracts its text.
pub fn extract_file(path: &Path) -> Result<UploadedDocument, ExtractError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!(path = %path.display(), size = bytes.len(), "Read upload from disk");
    extract_text(&name, &bytes)
}

/// Checks size and signature without parsing the document.
pub fn validate_upload(name: &str, bytes: &[u8]) -> Result<(), ExtractError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ExtractError::TooLarge {
            name: name.to_string(),
            size: bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ExtractError::NotPdf {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn into_document(name: &str, size: usize, text: String) -> Result<UploadedDocument, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::NoText {
            name: name.to_string(),
        });
    }

    info!(file = name, size, chars = text.chars().count(), "Extracted text from upload");

    Ok(UploadedDocument {
        id: Uuid::new_v4(),
        name: name.to_string(),
        size,
        extracted_text: text,
    })
}
