//! # docval
//!
//! Submit a scanned insurance document (PDF) to a remote validation service
//! and turn its response into a per-page report.
//!
//! The service runs OCR, logo and signature detection, and checks the
//! extracted fields against the insured person's name and a reference date.
//! Its answer is a set of loosely coupled, page-indexed collections that may
//! arrive in more than one shape. This crate owns the client side: local
//! preconditions, the upload, error classification, a synthetic progress
//! ramp, and the reconciliation of those collections into one record per
//! page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF + person name (+ date)
//!  │
//!  ├─ 1. Input      read the file, sniff its MIME type
//!  ├─ 2. Request    size / type / name checks, date → DD/MM/YYYY
//!  ├─ 3. Submit     multipart POST, timeout, progress ramp
//!  ├─ 4. Classify   network / timeout / HTTP status / malformed body
//!  └─ 5. Reconcile  page-indexed collections → Vec<PageRecord> + verdict
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docval::{validate, ValidationOutcome, ValidatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Service URL from VALIDATOR_API_URL, else http://localhost:9002
//!     let config = ValidatorConfig::from_env()?;
//!     match validate("policy.pdf", "Ana Pérez", Some("2024-03-07"), &config).await {
//!         ValidationOutcome::Success(report) => {
//!             for page in &report.pages {
//!                 println!("page {}: {:?}", page.page_number, page.observation);
//!             }
//!             println!("verdict: {}", report.final_verdict.verdict);
//!         }
//!         ValidationOutcome::Failure(f) => eprintln!("{}", f.message),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docval` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docval = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ValidatorConfig, ValidatorConfigBuilder};
pub use error::{ClassifiedError, InputError};
pub use notify::{FailureNotifier, NoopNotifier, SharedNotifier, TracingNotifier};
pub use pipeline::request::{DocumentFile, SubmissionRequest};
pub use pipeline::submit::ValidationClient;
pub use progress::{NoopProgressSink, ProgressCallback, ProgressSink};
pub use report::{
    ClassifiedFailure, DocumentInfo, FinalVerdict, ImageChecks, InsuredPerson, Observation,
    PageRecord, SignatureRegion, ValidationOutcome, ValidationReport,
};
pub use validate::{validate, validate_sync, Validator};
