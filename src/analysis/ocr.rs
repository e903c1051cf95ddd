//! Attachment classification and best-effort text extraction.
//!
//! Extraction is strictly best-effort: any failure (fetch, decode, OCR)
//! degrades to "no extracted text" and the provider chain continues. PDFs
//! are recognized for prompt framing but never extracted.

use super::AnalysisError;
use crate::models::RecordDescriptor;

/// Recognized attachment categories, by file-name extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
}

/// Classify an attachment file name. Unrecognized extensions return None.
pub fn classify_attachment(file_name: &str) -> Option<AttachmentKind> {
    let ext = file_name.rsplit('.').next()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "png" => Some(AttachmentKind::Image),
        "pdf" => Some(AttachmentKind::Pdf),
        _ => None,
    }
}

/// True when the record carries a recognized image or PDF attachment.
pub fn has_recognized_attachment(record: &RecordDescriptor) -> bool {
    record
        .file_name
        .as_deref()
        .and_then(classify_attachment)
        .is_some()
}

/// Fetch an image attachment and extract its text. Returns None for
/// non-image attachments and on any failure along the way.
pub fn extract_attachment_text(
    client: &reqwest::blocking::Client,
    record: &RecordDescriptor,
) -> Option<String> {
    let file_name = record.file_name.as_deref()?;
    if classify_attachment(file_name) != Some(AttachmentKind::Image) {
        return None;
    }
    let url = record.file_url.as_deref()?;

    let bytes = match fetch_bytes(client, url) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url, error = %e, "Attachment fetch failed, continuing without text");
            return None;
        }
    };

    match ocr_image(&bytes) {
        Ok(text) => {
            let collapsed = collapse_whitespace(&text);
            if collapsed.is_empty() {
                None
            } else {
                Some(collapsed)
            }
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "OCR failed, continuing without text");
            None
        }
    }
}

fn fetch_bytes(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>, AnalysisError> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| AnalysisError::Extraction(format!("attachment fetch failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(AnalysisError::Extraction(format!(
            "attachment fetch returned status {status}"
        )));
    }
    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| AnalysisError::Extraction(e.to_string()))
}

/// English-configured OCR over raw image bytes.
#[cfg(feature = "ocr")]
fn ocr_image(image_bytes: &[u8]) -> Result<String, AnalysisError> {
    let tess = tesseract::Tesseract::new(None, Some("eng"))
        .map_err(|e| AnalysisError::Extraction(format!("{e:?}")))?;
    let mut tess = tess
        .set_image_from_mem(image_bytes)
        .map_err(|e| AnalysisError::Extraction(format!("{e:?}")))?;
    tess.get_text()
        .map_err(|e| AnalysisError::Extraction(format!("{e:?}")))
}

/// Without the `ocr` feature there is no engine; callers treat this exactly
/// like a failed extraction.
#[cfg(not(feature = "ocr"))]
fn ocr_image(_image_bytes: &[u8]) -> Result<String, AnalysisError> {
    Err(AnalysisError::Extraction(
        "built without the ocr feature".to_string(),
    ))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
