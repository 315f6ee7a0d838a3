//! Validation client: one multipart POST, one classified result.
//!
//! The only stage with network I/O. Every failure is folded into a
//! [`ClassifiedError`] here, so nothing downstream ever handles a raw
//! `reqwest::Error`.
//!
//! ## Classification order
//!
//! 1. no response at all (refused, DNS, offline) → `NetworkUnreachable`
//! 2. the configured timeout elapsed → `Timeout`
//! 3. non-2xx status → `ServerRejected(status, detail)`
//! 4. 2xx whose body is not JSON or has no report fields → `MalformedResponse`
//! 5. otherwise the body is handed to the reconciler
//!
//! There is no retry. A failed attempt is terminal; resubmitting is the
//! caller's decision.

use crate::config::ValidatorConfig;
use crate::error::ClassifiedError;
use crate::pipeline::raw::has_report_fields;
use crate::pipeline::reconcile::reconcile;
use crate::pipeline::request::{SubmissionRequest, PDF_MIME};
use crate::report::ValidationOutcome;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// HTTP client bound to one validation service.
///
/// Holds no per-submission state; concurrent use is the caller's concern.
#[derive(Debug, Clone)]
pub struct ValidationClient {
    http: reqwest::Client,
    config: ValidatorConfig,
}

impl ValidationClient {
    pub fn new(config: ValidatorConfig) -> Result<Self, ClassifiedError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClassifiedError::Unknown {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Submit a request and reconcile the response.
    pub async fn submit(&self, request: SubmissionRequest) -> ValidationOutcome {
        match self.send(request).await {
            Ok(body) => ValidationOutcome::Success(reconcile(&body)),
            Err(e) => ValidationOutcome::failure(e),
        }
    }

    /// Submit a request and return the raw, shape-checked response body.
    ///
    /// The whole exchange (upload, server processing, body download) runs
    /// under the configured timeout; on expiry the in-flight call is dropped.
    pub async fn send(&self, request: SubmissionRequest) -> Result<Value, ClassifiedError> {
        let start = Instant::now();
        let url = self.config.endpoint();
        info!(
            "Submitting '{}' ({} bytes) to {}",
            request.file().name,
            request.file().size(),
            url
        );

        let secs = self.config.timeout_secs;
        let result = match tokio::time::timeout(self.config.timeout(), self.exchange(&url, request))
            .await
        {
            Ok(r) => r,
            Err(_) => Err(ClassifiedError::Timeout { secs }),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!("Validation response received in {}ms", elapsed_ms),
            Err(e) => warn!(
                "Validation failed after {}ms [{}]: {}",
                elapsed_ms,
                e.kind(),
                e
            ),
        }
        result
    }

    async fn exchange(
        &self,
        url: &str,
        request: SubmissionRequest,
    ) -> Result<Value, ClassifiedError> {
        let form = multipart_form(request)?;
        let secs = self.config.timeout_secs;

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_transport(e, secs))?;

        let status = response.status();
        debug!("HTTP {} from {}", status, url);

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) if e.is_timeout() => return Err(ClassifiedError::Timeout { secs }),
            Err(e) if status.is_success() => {
                return Err(ClassifiedError::MalformedResponse {
                    detail: format!("failed to read response body: {e}"),
                });
            }
            Err(e) => {
                debug!("Could not read error body: {}", e);
                Default::default()
            }
        };

        if !status.is_success() {
            return Err(rejected(status, &bytes));
        }
        parse_report_body(&bytes)
    }
}

/// Assemble the multipart body: `file`, then [`SubmissionRequest::text_fields`].
fn multipart_form(request: SubmissionRequest) -> Result<Form, ClassifiedError> {
    let fields = request.text_fields();
    let file = request.into_file();
    let part = Part::bytes(file.bytes)
        .file_name(file.name)
        .mime_str(PDF_MIME)
        .map_err(|e| ClassifiedError::Unknown {
            message: format!("Failed to build multipart body: {e}"),
        })?;

    Ok(fields
        .into_iter()
        .fold(Form::new().part("file", part), |form, (name, value)| {
            form.text(name, value)
        }))
}

/// Classify an error raised before any response arrived.
pub fn classify_transport(e: reqwest::Error, timeout_secs: u64) -> ClassifiedError {
    if e.is_timeout() {
        ClassifiedError::Timeout { secs: timeout_secs }
    } else if e.is_builder() {
        ClassifiedError::Unknown {
            message: e.to_string(),
        }
    } else {
        ClassifiedError::NetworkUnreachable {
            detail: e.to_string(),
        }
    }
}

/// Build `ServerRejected`, preferring the body's `detail` over the status default.
pub fn rejected(status: StatusCode, body: &[u8]) -> ClassifiedError {
    let code = status.as_u16();
    let detail = error_detail(body)
        .unwrap_or_else(|| ClassifiedError::default_detail(code).to_string());
    ClassifiedError::ServerRejected {
        status: code,
        detail,
    }
}

/// Pull a human-readable message out of an error body, if it carries one.
///
/// Accepts `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}, ...]}` emitted by request-validation layers.
pub fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|i| i.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

/// Parse a 2xx body and apply the minimal shape check.
pub fn parse_report_body(body: &[u8]) -> Result<Value, ClassifiedError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ClassifiedError::MalformedResponse {
            detail: format!("body is not valid JSON: {e}"),
        })?;
    if !has_report_fields(&value) {
        return Err(ClassifiedError::MalformedResponse {
            detail: "body carries no report fields".into(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_is_extracted() {
        assert_eq!(
            error_detail(br#"{"detail":"bad policy number"}"#).as_deref(),
            Some("bad policy number")
        );
    }

    #[test]
    fn detail_list_is_joined() {
        let body = br#"{"detail":[{"loc":["body","file"],"msg":"field required"},{"msg":"bad date"}]}"#;
        assert_eq!(
            error_detail(body).as_deref(),
            Some("field required; bad date")
        );
    }

    #[test]
    fn missing_or_blank_detail_yields_none() {
        assert_eq!(error_detail(b""), None);
        assert_eq!(error_detail(b"<html>Bad Gateway</html>"), None);
        assert_eq!(error_detail(br#"{"error":"x"}"#), None);
        assert_eq!(error_detail(br#"{"detail":"  "}"#), None);
        assert_eq!(error_detail(br#"{"detail":42}"#), None);
    }

    #[test]
    fn rejected_falls_back_to_status_default() {
        let e = rejected(StatusCode::BAD_REQUEST, b"");
        assert_eq!(
            e,
            ClassifiedError::ServerRejected {
                status: 400,
                detail: "Invalid file or missing data".into()
            }
        );
        let e = rejected(StatusCode::PAYLOAD_TOO_LARGE, b"{}");
        assert_eq!(
            e,
            ClassifiedError::ServerRejected {
                status: 413,
                detail: "The file is too large".into()
            }
        );
        let e = rejected(StatusCode::BAD_GATEWAY, b"upstream down");
        assert!(matches!(
            e,
            ClassifiedError::ServerRejected { status: 502, ref detail } if detail == "Validation process failed"
        ));
    }

    #[test]
    fn rejected_prefers_body_detail() {
        let e = rejected(StatusCode::BAD_REQUEST, br#"{"detail":"bad policy number"}"#);
        assert_eq!(
            e,
            ClassifiedError::ServerRejected {
                status: 400,
                detail: "bad policy number".into()
            }
        );
    }

    #[test]
    fn report_body_shape_check() {
        assert!(parse_report_body(br#"{"total_pages":1,"final_verdict":{}}"#).is_ok());
        assert!(parse_report_body(br#"{"validation_results":{}}"#).is_ok());

        let e = parse_report_body(b"not json").unwrap_err();
        assert_eq!(e.kind(), "malformed_response");
        let e = parse_report_body(br#"{"status":"ok"}"#).unwrap_err();
        assert_eq!(e.kind(), "malformed_response");
        let e = parse_report_body(b"[]").unwrap_err();
        assert_eq!(e.kind(), "malformed_response");
    }
}
