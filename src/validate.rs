//! Top-level validation entry points.
//!
//! [`Validator`] wires the stages together for one attempt:
//!
//! ```text
//! build request ──▶ start ramp ──▶ submit ──▶ finish ramp ──▶ reconcile / notify
//! ```
//!
//! A request that fails local checks never reaches the network and never
//! starts the ramp. The ramp is finished strictly after the submission
//! resolves, whatever the outcome.

use crate::config::ValidatorConfig;
use crate::error::ClassifiedError;
use crate::notify::{FailureNotifier, SharedNotifier, TracingNotifier};
use crate::pipeline::input::load_document;
use crate::pipeline::request::{self, DocumentFile};
use crate::pipeline::submit::ValidationClient;
use crate::progress::{NoopProgressSink, ProgressCallback, ProgressReporter};
use crate::report::ValidationOutcome;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs validation attempts against one service.
///
/// # Example
/// ```rust,no_run
/// use docval::{Validator, ValidatorConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let validator = Validator::new(ValidatorConfig::from_env()?)?;
/// let outcome = validator
///     .validate_path("policy.pdf", "Ana Pérez", Some("2024-03-07"))
///     .await;
/// match outcome.into_result() {
///     Ok(report) => println!("verdict: {}", report.final_verdict.verdict),
///     Err(e) => eprintln!("{}", e.message()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Validator {
    client: ValidationClient,
    notifier: SharedNotifier,
    progress: ProgressCallback,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("client", &self.client)
            .field("notifier", &"<dyn FailureNotifier>")
            .field("progress", &"<dyn ProgressSink>")
            .finish()
    }
}

impl Validator {
    /// Validator with the tracing notifier and no progress display.
    pub fn new(config: ValidatorConfig) -> Result<Self, ClassifiedError> {
        Ok(Self {
            client: ValidationClient::new(config)?,
            notifier: Arc::new(TracingNotifier),
            progress: Arc::new(NoopProgressSink),
        })
    }

    pub fn with_notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        self.client.config()
    }

    /// Validate an in-memory file.
    ///
    /// Never fails: every failure path resolves to
    /// [`ValidationOutcome::Failure`], and the notifier sees it first.
    pub async fn validate(
        &self,
        file: Option<DocumentFile>,
        person_name: &str,
        reference_date: Option<&str>,
    ) -> ValidationOutcome {
        let config = self.client.config();
        let request = match request::build(file, person_name, reference_date, config.max_file_size)
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Request rejected locally: {}", e);
                return self.fail(e.into());
            }
        };

        let ramp = ProgressReporter::start(config, Arc::clone(&self.progress));
        let outcome = self.client.submit(request).await;
        ramp.finish(outcome.is_success());

        match outcome {
            ValidationOutcome::Success(report) => {
                info!(
                    "Validation complete: {} pages, verdict {}",
                    report.total_pages, report.final_verdict.verdict
                );
                ValidationOutcome::Success(report)
            }
            ValidationOutcome::Failure(f) => self.fail(f.error),
        }
    }

    /// Load a local file, then [`Self::validate`] it.
    pub async fn validate_path(
        &self,
        path: impl AsRef<Path>,
        person_name: &str,
        reference_date: Option<&str>,
    ) -> ValidationOutcome {
        match load_document(path).await {
            Ok(file) => self.validate(Some(file), person_name, reference_date).await,
            Err(e) => self.fail(e.into()),
        }
    }

    fn fail(&self, error: ClassifiedError) -> ValidationOutcome {
        self.notifier.notify(&error);
        ValidationOutcome::failure(error)
    }
}

/// Validate a local PDF with default collaborators.
pub async fn validate(
    path: impl AsRef<Path>,
    person_name: &str,
    reference_date: Option<&str>,
    config: &ValidatorConfig,
) -> ValidationOutcome {
    match Validator::new(config.clone()) {
        Ok(v) => v.validate_path(path, person_name, reference_date).await,
        Err(e) => {
            TracingNotifier.notify(&e);
            ValidationOutcome::failure(e)
        }
    }
}

/// Synchronous wrapper around [`validate`].
///
/// Creates a temporary tokio runtime internally.
pub fn validate_sync(
    path: impl AsRef<Path>,
    person_name: &str,
    reference_date: Option<&str>,
    config: &ValidatorConfig,
) -> ValidationOutcome {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(validate(path, person_name, reference_date, config)),
        Err(e) => ValidationOutcome::failure(ClassifiedError::Unknown {
            message: format!("Failed to create tokio runtime: {e}"),
        }),
    }
}
