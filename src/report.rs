//! Reconciled view model handed to the presentation layer.
//!
//! Nothing in here mirrors a wire shape: the raw service response is folded
//! into these types by [`crate::pipeline::reconcile`] and then discarded.

use crate::error::ClassifiedError;
use serde::{Deserialize, Serialize};

/// The result of one validation attempt. Exactly one branch is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Success(ValidationReport),
    Failure(ClassifiedFailure),
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Success(_))
    }

    /// Convert into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<ValidationReport, ClassifiedError> {
        match self {
            ValidationOutcome::Success(report) => Ok(report),
            ValidationOutcome::Failure(f) => Err(f.error),
        }
    }

    pub fn failure(error: ClassifiedError) -> Self {
        ValidationOutcome::Failure(ClassifiedFailure::from(error))
    }
}

/// Serializable wrapper for a [`ClassifiedError`].
///
/// Carries the kind tag and rendered message next to the error so JSON
/// consumers don't need to know the Rust enum layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedFailure {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip)]
    pub error: ClassifiedError,
}

impl From<ClassifiedError> for ClassifiedFailure {
    fn from(error: ClassifiedError) -> Self {
        let status = match &error {
            ClassifiedError::ServerRejected { status, .. } => Some(*status),
            _ => None,
        };
        Self {
            kind: error.kind().to_string(),
            message: error.message(),
            status,
            error,
        }
    }
}

/// Reconciled validation report: one record per page plus the overall verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Page count declared by the service (or derived from the page entries).
    pub total_pages: usize,
    /// Exactly `total_pages` records, ordered by `page_number` starting at 1.
    pub pages: Vec<PageRecord>,
    pub final_verdict: FinalVerdict,
    /// Document-wide signature count, when the service reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_signatures: Option<u32>,
}

impl ValidationReport {
    /// Look up a page by its 1-based number.
    pub fn page(&self, page_number: usize) -> Option<&PageRecord> {
        page_number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .filter(|p| p.page_number == page_number)
    }

    /// Pages whose observation carries a positive verdict.
    pub fn passed_pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages
            .iter()
            .filter(|p| p.observation.as_ref().and_then(|o| o.verdict) == Some(true))
    }
}

/// Composite per-page record. Any sub-record the service did not report for
/// this page is `None`; the page itself is never dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_number: usize,
    pub document_info: Option<DocumentInfo>,
    pub observation: Option<Observation>,
    pub image_checks: Option<ImageChecks>,
}

impl PageRecord {
    pub fn empty(page_number: usize) -> Self {
        Self {
            page_number,
            ..Self::default()
        }
    }

    /// True when the service reported nothing at all for this page.
    pub fn is_empty(&self) -> bool {
        self.document_info.is_none() && self.observation.is_none() && self.image_checks.is_none()
    }
}

/// Policy data extracted from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Validity window as printed on the policy.
    pub validity: Option<String>,
    pub company: Option<String>,
    pub policy_number: Option<String>,
    pub issuance_date: Option<String>,
    pub insured_person: Option<InsuredPerson>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuredPerson {
    pub name: Option<String>,
    pub policy_number: Option<String>,
    pub company: Option<String>,
}

/// The service's page-level judgment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub verdict: Option<bool>,
    pub reason: Option<String>,
    pub validity_passed: Option<bool>,
    pub policy_passed: Option<bool>,
    pub person_passed: Option<bool>,
}

/// Logo and signature detection for a page, normalised across response shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageChecks {
    pub logo_detected: Option<bool>,
    /// Name of the logo the detector matched, when reported.
    pub logo_label: Option<String>,
    pub signature_detected: Option<bool>,
    pub signatures_found: Option<u32>,
    pub signature_regions: Vec<SignatureRegion>,
    pub diagnostic: Option<String>,
}

/// Bounding box of a detected signature, in page pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRegion {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

/// The overall pass/fail judgment for the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub verdict: bool,
    pub reason: String,
    pub logo_passed: Option<bool>,
    pub validity_passed: Option<bool>,
    pub signature_passed: Option<bool>,
    pub person_passed: Option<bool>,
}
