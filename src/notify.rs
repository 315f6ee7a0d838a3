//! Failure notification, kept apart from classification.
//!
//! The client only *returns* a [`ClassifiedError`]. Surfacing it to a human
//! (a log line, a terminal message, a toast in some other front-end) is a
//! separate collaborator that [`crate::Validator`] invokes once per failed
//! attempt. The returned outcome stays authoritative for program logic.

use crate::error::ClassifiedError;
use std::sync::Arc;
use tracing::error;

/// Receives every classified failure, exactly once per attempt.
pub trait FailureNotifier: Send + Sync {
    fn notify(&self, error: &ClassifiedError);
}

/// Default notifier: an `ERROR`-level tracing event.
pub struct TracingNotifier;

impl FailureNotifier for TracingNotifier {
    fn notify(&self, e: &ClassifiedError) {
        error!(kind = e.kind(), "Document validation failed: {}", e);
    }
}

/// Discards notifications.
pub struct NoopNotifier;

impl FailureNotifier for NoopNotifier {
    fn notify(&self, _error: &ClassifiedError) {}
}

/// Convenience alias for the notifier type stored by [`crate::Validator`].
pub type SharedNotifier = Arc<dyn FailureNotifier>;
