//! Input loading: read a user-supplied path into an in-memory [`DocumentFile`].
//!
//! The service takes the whole PDF in a single multipart part, so the file
//! is read eagerly. The declared MIME type is sniffed from the `%PDF` magic
//! bytes first and the extension second; the request builder then decides
//! whether that type is acceptable.

use crate::error::InputError;
use crate::pipeline::request::{DocumentFile, PDF_MIME};
use std::path::Path;
use tracing::debug;

/// Fallback MIME type for anything that is not recognisably a PDF.
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Read a local file into a [`DocumentFile`].
pub async fn load_document(path: impl AsRef<Path>) -> Result<DocumentFile, InputError> {
    let path = path.as_ref();

    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InputError::MissingFile);
        }
        Err(e) => {
            return Err(InputError::FileUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    let mime_type = sniff_mime(path, &bytes);

    debug!(
        "Loaded {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        mime_type
    );
    Ok(DocumentFile::new(name, mime_type, bytes))
}

/// Guess the MIME type from magic bytes, then from the extension.
pub fn sniff_mime(path: &Path, bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        return PDF_MIME;
    }
    // Some scanners emit a preamble before the header.
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME,
        _ => OCTET_STREAM_MIME,
    }
}
