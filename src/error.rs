//! Error types for the docval library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`InputError`]: **local**, a precondition on the file or metadata does
//!   not hold. No network call is made. Always recoverable by correcting the
//!   input and resubmitting.
//!
//! * [`ClassifiedError`]: **terminal for the attempt**, the fixed taxonomy
//!   every submission failure is folded into before it leaves the client.
//!   Callers never see a raw transport error, only one of these variants.
//!
//! An [`InputError`] converts into [`ClassifiedError::InvalidInput`] so the
//! presentation layer has a single type to render.

use std::path::PathBuf;
use thiserror::Error;

const MIB: u64 = 1024 * 1024;

/// A local precondition failure raised by the request builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// No file was supplied, or the supplied file is empty.
    #[error("A PDF file is required")]
    MissingFile,

    /// The file's declared MIME type is not `application/pdf`.
    #[error("Only PDF files are accepted (got '{mime_type}')")]
    NotAPdf { mime_type: String },

    /// The file exceeds the configured ceiling.
    #[error("The file exceeds the maximum allowed size of {}MiB ({size} bytes)", format_mib(.limit))]
    FileTooLarge { size: u64, limit: u64 },

    /// The person name is empty after trimming.
    #[error("The person's name is required")]
    EmptyPersonName,

    /// The reference date is not a `YYYY-MM-DD` calendar date.
    #[error("Invalid reference date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// The file exists but could not be read.
    #[error("Could not read '{path}': {reason}")]
    FileUnreadable { path: PathBuf, reason: String },
}

/// Render a byte count as MiB, without a trailing `.0` for whole values.
fn format_mib(bytes: &u64) -> String {
    let bytes = *bytes;
    if bytes % MIB == 0 {
        (bytes / MIB).to_string()
    } else {
        format!("{:.1}", bytes as f64 / MIB as f64)
    }
}

/// Every way a validation attempt can fail.
///
/// Created only by the validation client (or by converting an
/// [`InputError`]); never retained beyond a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifiedError {
    /// A local precondition failed; no request was sent.
    #[error("{reason}")]
    InvalidInput { reason: String },

    /// The service did not answer within the configured timeout.
    #[error("The validation service did not respond within {secs}s")]
    Timeout { secs: u64 },

    /// No response at all: connection refused, DNS failure, offline.
    #[error("Could not reach the validation service: {detail}")]
    NetworkUnreachable { detail: String },

    /// The service answered with a non-2xx status.
    #[error("{detail} (HTTP {status})")]
    ServerRejected { status: u16, detail: String },

    /// A 2xx response whose body is not a usable report.
    #[error("The validation service returned an unusable response: {detail}")]
    MalformedResponse { detail: String },

    /// Anything that fits none of the above.
    #[error("Unexpected error while validating the document: {message}")]
    Unknown { message: String },
}

impl ClassifiedError {
    /// Human-readable message for display.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Stable snake_case tag, suitable for logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedError::InvalidInput { .. } => "invalid_input",
            ClassifiedError::Timeout { .. } => "timeout",
            ClassifiedError::NetworkUnreachable { .. } => "network_unreachable",
            ClassifiedError::ServerRejected { .. } => "server_rejected",
            ClassifiedError::MalformedResponse { .. } => "malformed_response",
            ClassifiedError::Unknown { .. } => "unknown",
        }
    }

    /// Fallback detail for a rejected request whose body carried none.
    pub fn default_detail(status: u16) -> &'static str {
        match status {
            400 => "Invalid file or missing data",
            401 | 403 => "Not authorised to use the validation service",
            404 => "Validation service not found",
            413 => "The file is too large",
            500 => "The validation service failed internally",
            _ => "Validation process failed",
        }
    }
}

impl From<InputError> for ClassifiedError {
    fn from(e: InputError) -> Self {
        ClassifiedError::InvalidInput {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_too_large_names_limit_in_mib() {
        let e = InputError::FileTooLarge {
            size: 11 * MIB,
            limit: 10 * MIB,
        };
        let msg = e.to_string();
        assert!(msg.contains("10MiB"), "got: {msg}");
    }

    #[test]
    fn fractional_limit_keeps_one_decimal() {
        let e = InputError::FileTooLarge {
            size: 2 * MIB,
            limit: MIB + MIB / 2,
        };
        assert!(e.to_string().contains("1.5MiB"));
    }

    #[test]
    fn input_error_becomes_invalid_input() {
        let e: ClassifiedError = InputError::EmptyPersonName.into();
        assert_eq!(e.kind(), "invalid_input");
        assert_eq!(e.message(), "The person's name is required");
    }

    #[test]
    fn server_rejected_display_includes_status() {
        let e = ClassifiedError::ServerRejected {
            status: 400,
            detail: "bad policy number".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("bad policy number"));
        assert!(msg.contains("400"));
    }

    #[test]
    fn default_details_cover_known_statuses() {
        assert_eq!(ClassifiedError::default_detail(400), "Invalid file or missing data");
        assert_eq!(ClassifiedError::default_detail(413), "The file is too large");
        assert_eq!(
            ClassifiedError::default_detail(401),
            ClassifiedError::default_detail(403)
        );
        assert_eq!(ClassifiedError::default_detail(404), "Validation service not found");
        assert_eq!(
            ClassifiedError::default_detail(500),
            "The validation service failed internally"
        );
        assert_eq!(ClassifiedError::default_detail(418), "Validation process failed");
    }

    #[test]
    fn timeout_display() {
        let e = ClassifiedError::Timeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
        assert_eq!(e.kind(), "timeout");
    }
}
