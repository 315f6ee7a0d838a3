//! Request builder: local precondition checks before anything touches the network.
//!
//! [`build`] is pure. It either returns an immutable [`SubmissionRequest`]
//! or an [`InputError`]; a request that fails here is never sent.

use crate::error::InputError;
use chrono::NaiveDate;
use std::fmt;

/// The only MIME type the service accepts.
pub const PDF_MIME: &str = "application/pdf";

/// Wire format of the optional reference date.
pub const USER_DATE_FORMAT: &str = "%d/%m/%Y";

/// An in-memory file with its declared MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// A validated, ready-to-send submission.
///
/// Fields are private so the only way to obtain one is through [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    file: DocumentFile,
    person_name: String,
    user_date: Option<String>,
}

impl SubmissionRequest {
    pub fn file(&self) -> &DocumentFile {
        &self.file
    }

    /// Trimmed person name, as sent in `person_name`.
    pub fn person_name(&self) -> &str {
        &self.person_name
    }

    /// Reference date already in `DD/MM/YYYY`, as sent in `user_date`.
    pub fn user_date(&self) -> Option<&str> {
        self.user_date.as_deref()
    }

    /// Text fields of the multipart body, in send order.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("person_name", self.person_name.clone())];
        if let Some(ref d) = self.user_date {
            fields.push(("user_date", d.clone()));
        }
        fields
    }

    pub(crate) fn into_file(self) -> DocumentFile {
        self.file
    }
}

/// Validate inputs and assemble a [`SubmissionRequest`].
///
/// # Errors
/// - [`InputError::MissingFile`] when `file` is `None` or empty
/// - [`InputError::NotAPdf`] when the MIME type is not `application/pdf`
/// - [`InputError::FileTooLarge`] when the size exceeds `max_file_size`
/// - [`InputError::EmptyPersonName`] when the name is blank after trimming
/// - [`InputError::InvalidDate`] when a non-blank date is not `YYYY-MM-DD`
pub fn build(
    file: Option<DocumentFile>,
    person_name: &str,
    reference_date: Option<&str>,
    max_file_size: u64,
) -> Result<SubmissionRequest, InputError> {
    let file = match file {
        Some(f) if !f.bytes.is_empty() => f,
        _ => return Err(InputError::MissingFile),
    };

    if !file.mime_type.trim().eq_ignore_ascii_case(PDF_MIME) {
        return Err(InputError::NotAPdf {
            mime_type: file.mime_type.clone(),
        });
    }

    if file.size() > max_file_size {
        return Err(InputError::FileTooLarge {
            size: file.size(),
            limit: max_file_size,
        });
    }

    let person_name = person_name.trim();
    if person_name.is_empty() {
        return Err(InputError::EmptyPersonName);
    }

    let user_date = match reference_date.map(str::trim) {
        Some(d) if !d.is_empty() => Some(format_user_date(d)?),
        _ => None,
    };

    Ok(SubmissionRequest {
        file,
        person_name: person_name.to_string(),
        user_date,
    })
}

/// Reformat an ISO `YYYY-MM-DD` date as `DD/MM/YYYY`.
pub fn format_user_date(iso: &str) -> Result<String, InputError> {
    NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .map(|d| d.format(USER_DATE_FORMAT).to_string())
        .map_err(|_| InputError::InvalidDate {
            input: iso.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 10 * 1024 * 1024;

    fn pdf(len: usize) -> DocumentFile {
        let mut bytes = b"%PDF".to_vec();
        bytes.resize(len.max(4), b' ');
        DocumentFile::new("policy.pdf", PDF_MIME, bytes)
    }

    #[test]
    fn builds_valid_request() {
        let req = build(Some(pdf(100)), "  Ana Pérez ", Some("2024-03-07"), LIMIT).unwrap();
        assert_eq!(req.person_name(), "Ana Pérez");
        assert_eq!(req.user_date(), Some("07/03/2024"));
        assert_eq!(
            req.text_fields(),
            vec![
                ("person_name", "Ana Pérez".to_string()),
                ("user_date", "07/03/2024".to_string())
            ]
        );
    }

    #[test]
    fn missing_file_is_rejected() {
        assert_eq!(
            build(None, "Ana", None, LIMIT).unwrap_err(),
            InputError::MissingFile
        );
        let empty = DocumentFile::new("x.pdf", PDF_MIME, Vec::new());
        assert_eq!(
            build(Some(empty), "Ana", None, LIMIT).unwrap_err(),
            InputError::MissingFile
        );
    }

    #[test]
    fn non_pdf_mime_is_rejected() {
        for mime in ["image/png", "application/octet-stream", "text/plain", "application/x-pdf"] {
            let f = DocumentFile::new("x", mime, vec![1, 2, 3]);
            let err = build(Some(f), "Ana", None, LIMIT).unwrap_err();
            assert!(matches!(err, InputError::NotAPdf { .. }), "{mime}: {err:?}");
        }
    }

    #[test]
    fn mime_comparison_ignores_case() {
        let f = DocumentFile::new("x.pdf", "Application/PDF", b"%PDF".to_vec());
        assert!(build(Some(f), "Ana", None, LIMIT).is_ok());
    }

    #[test]
    fn oversize_file_names_limit() {
        let err = build(Some(pdf(2048)), "Ana", None, 1024).unwrap_err();
        assert!(matches!(err, InputError::FileTooLarge { size: 2048, .. }));

        let err = build(Some(pdf(11 * 1024 * 1024)), "Ana", None, LIMIT).unwrap_err();
        assert!(err.to_string().contains("10MiB"), "got: {err}");
    }

    #[test]
    fn file_at_limit_is_accepted() {
        assert!(build(Some(pdf(1024)), "Ana", None, 1024).is_ok());
    }

    #[test]
    fn blank_person_name_is_rejected() {
        assert_eq!(
            build(Some(pdf(10)), "   \t", None, LIMIT).unwrap_err(),
            InputError::EmptyPersonName
        );
    }

    #[test]
    fn blank_date_is_omitted() {
        let req = build(Some(pdf(10)), "Ana", Some("  "), LIMIT).unwrap();
        assert_eq!(req.user_date(), None);
        assert_eq!(req.text_fields().len(), 1);
    }

    #[test]
    fn malformed_date_is_rejected() {
        for bad in ["07/03/2024", "2024-13-01", "2024-02-30", "yesterday"] {
            let err = build(Some(pdf(10)), "Ana", Some(bad), LIMIT).unwrap_err();
            assert!(matches!(err, InputError::InvalidDate { .. }), "{bad}");
        }
    }
}
