//! Document store: loads the building code as one block of text.
//!
//! PDFs are read page by page with `lopdf` so a single unreadable page only
//! leaves a gap instead of failing the whole load. When no page yields any
//! text, `pdf-extract` gets one pass over the whole file, since its font
//! decoding handles some encodings `lopdf` does not. Plain-text files
//! (`.txt`, `.md`) are taken as a single page.

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{DataSource, QueryError};
use crate::models::ReferenceDocument;

/// Upper bound for the whole-document `pdf-extract` pass.
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Loads the reference document at `path`.
///
/// # Errors
///
/// [`QueryError::DataUnavailable`] when the file is missing, empty, cannot
/// be parsed, or contains no extractable text at all.
pub fn load(path: &Path) -> Result<ReferenceDocument, QueryError> {
    let unavailable = |reason: String| QueryError::data_unavailable(DataSource::Document, reason);

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => unavailable(format!("file not found: {}", path.display())),
        _ => unavailable(format!("cannot read {}: {}", path.display(), e)),
    })?;

    if bytes.is_empty() {
        return Err(unavailable(format!("file is empty: {}", path.display())));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let document = match extension.as_str() {
        "txt" | "md" => {
            let text = String::from_utf8(bytes)
                .map_err(|_| unavailable(format!("not valid UTF-8: {}", path.display())))?;
            ReferenceDocument::from_pages(&[text])
        }
        _ => pdf_document(&bytes).map_err(unavailable)?,
    };

    if document.text.trim().is_empty() {
        return Err(unavailable(format!(
            "no extractable text in {}",
            path.display()
        )));
    }

    tracing::info!(
        path = %path.display(),
        pages = document.page_count,
        chars = document.text.len(),
        "loaded reference document"
    );
    Ok(document)
}

/// Extracts text from PDF bytes, one segment per page in page order.
pub fn pdf_document(bytes: &[u8]) -> Result<ReferenceDocument, String> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| format!("invalid PDF: {}", e))?;

    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        .map(|&number| match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page = number, error = %e, "page has no extractable text");
                String::new()
            }
        })
        .collect();

    if pages.is_empty() {
        return Err("PDF has no pages".to_string());
    }

    if pages.iter().all(|p| p.trim().is_empty()) {
        tracing::debug!("per-page extraction produced no text, retrying whole document");
        let text = extract_whole_document(bytes)?;
        return Ok(ReferenceDocument {
            text,
            page_count: pages.len(),
        });
    }

    Ok(ReferenceDocument::from_pages(&pages))
}

/// Runs `pdf-extract` on a worker thread.
///
/// `pdf-extract` panics on some malformed fonts and can hang on others;
/// both end up as an `Err` here instead of reaching the caller.
fn extract_whole_document(bytes: &[u8]) -> Result<String, String> {
    let data = bytes.to_vec();
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let _ = tx.send(pdf_extract::extract_text_from_mem(&data).map_err(|e| e.to_string()));
    });

    match rx.recv_timeout(EXTRACT_TIMEOUT) {
        Ok(Ok(text)) => {
            let _ = handle.join();
            Ok(text)
        }
        Ok(Err(e)) => {
            let _ = handle.join();
            Err(format!("no extractable text: {}", e))
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!(
                timeout_secs = EXTRACT_TIMEOUT.as_secs(),
                "PDF text extraction timed out"
            );
            Err("text extraction timed out".to_string())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = handle.join();
            tracing::warn!("PDF text extraction crashed");
            Err("text extraction failed on a malformed PDF".to_string())
        }
    }
}
