//! Dispatch error taxonomy.
//!
//! Every failure crossing the dispatcher boundary is a [`DispatchError`] with
//! a stable [`ErrorKind`]; callers map kinds to transport statuses and the UI
//! deep-links on them.  Vendor HTTP failures are classified here, uniformly
//! across vendors, and all vendor-provided text is redacted before it can
//! reach a caller or a log line.

use serde::Serialize;

use copyforge_catalog::Vendor;
use copyforge_keys::redact_secrets;

use crate::transport::CallFailure;

/// Longest vendor error fragment carried in an `Upstream` message.
const UPSTREAM_DETAIL_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Stable classification of a dispatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or oversized caller input; the caller's fault, never retried.
    InvalidInput,
    /// No key configured for the resolved vendor.
    MissingCredential,
    /// The vendor rejected the configured key.
    InvalidCredential,
    /// The vendor reports a billing or quota problem.
    Billing,
    /// The model id is not usable on the caller's vendor plan.
    ModelUnavailable,
    /// The vendor is throttling; the caller may retry later.
    RateLimited,
    /// The vendor returned no usable content.
    EmptyResponse,
    /// Any other vendor-side failure.
    Upstream,
}

impl ErrorKind {
    /// The stable wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::Billing => "billing",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::Upstream => "upstream",
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A classified dispatch failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}: {message}", .kind.as_str())]
pub struct DispatchError {
    /// The classification callers branch on.
    pub kind: ErrorKind,
    /// Human-readable detail, already redacted.
    pub message: String,
}

/// Convenience alias used throughout the dispatch crate.
pub type Result<T> = std::result::Result<T, DispatchError>;

impl DispatchError {
    /// Build an error, redacting the message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: redact_secrets(&message.into()),
        }
    }

    /// Caller input was rejected before any vendor call.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// No key configured for the resolved vendor.
    pub fn missing_credential(vendor: Vendor) -> Self {
        Self::new(
            ErrorKind::MissingCredential,
            format!("{} key not configured — add one in Settings", vendor.label()),
        )
    }

    /// The vendor produced an empty or absent content field.
    pub fn empty_response(vendor: Vendor) -> Self {
        Self::new(
            ErrorKind::EmptyResponse,
            format!("{} returned an empty response", vendor.label()),
        )
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a transport-level failure into a [`DispatchError`].
///
/// The table is identical for every vendor; only the vendor name in the
/// message differs.
pub fn classify_failure(vendor: Vendor, failure: CallFailure) -> DispatchError {
    match failure {
        CallFailure::Status { code, body } => classify_status(vendor, code, &body),
        CallFailure::Network { reason } => DispatchError::new(
            ErrorKind::Upstream,
            format!("{} request failed: {}", vendor.label(), truncate(&reason)),
        ),
        CallFailure::Protocol { reason } => DispatchError::new(
            ErrorKind::Upstream,
            format!("{} sent an unreadable response: {}", vendor.label(), truncate(&reason)),
        ),
    }
}

fn classify_status(vendor: Vendor, code: u16, body: &str) -> DispatchError {
    // OpenAI reports exhausted credit as 429 with an `insufficient_quota`
    // marker; that is a billing problem, not throttling.
    let billing_flagged = body.contains("insufficient_quota") || body.contains("billing");

    match code {
        401 => DispatchError::new(
            ErrorKind::InvalidCredential,
            format!("invalid {} key — check Settings", vendor.label()),
        ),
        402 => DispatchError::new(ErrorKind::Billing, format!("{} billing issue", vendor.label())),
        429 if billing_flagged => {
            DispatchError::new(ErrorKind::Billing, format!("{} billing issue", vendor.label()))
        }
        404 => DispatchError::new(
            ErrorKind::ModelUnavailable,
            "model not available on this plan".to_owned(),
        ),
        429 => DispatchError::new(
            ErrorKind::RateLimited,
            "rate limit hit — retry shortly".to_owned(),
        ),
        _ => DispatchError::new(
            ErrorKind::Upstream,
            format!("{} error ({code}): {}", vendor.label(), truncate(body)),
        ),
    }
}

/// Cap vendor detail at a char boundary.
fn truncate(text: &str) -> String {
    if text.chars().count() <= UPSTREAM_DETAIL_LIMIT {
        return text.to_owned();
    }
    let cut: String = text.chars().take(UPSTREAM_DETAIL_LIMIT).collect();
    format!("{cut}…")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &str) -> CallFailure {
        CallFailure::Status {
            code,
            body: body.to_owned(),
        }
    }

    #[test]
    fn classification_table() {
        let cases = [
            (401, "", ErrorKind::InvalidCredential),
            (402, "", ErrorKind::Billing),
            (404, "model `gpt-9` does not exist", ErrorKind::ModelUnavailable),
            (429, "slow down", ErrorKind::RateLimited),
            (500, "internal error", ErrorKind::Upstream),
            (503, "overloaded", ErrorKind::Upstream),
        ];
        for (code, body, expected) in cases {
            let err = classify_failure(Vendor::OpenAi, status(code, body));
            assert_eq!(err.kind, expected, "status {code}");
        }
    }

    #[test]
    fn quota_exhaustion_is_billing_not_rate_limit() {
        let err = classify_failure(
            Vendor::OpenAi,
            status(429, r#"{"error":{"type":"insufficient_quota"}}"#),
        );
        assert_eq!(err.kind, ErrorKind::Billing);
    }

    #[test]
    fn classification_is_vendor_uniform() {
        for vendor in [Vendor::OpenAi, Vendor::Anthropic, Vendor::Google, Vendor::Xai] {
            let err = classify_failure(vendor, status(401, ""));
            assert_eq!(err.kind, ErrorKind::InvalidCredential);
            assert!(err.message.contains(vendor.label()));
        }
    }

    #[test]
    fn upstream_message_carries_status_and_detail() {
        let err = classify_failure(Vendor::Anthropic, status(529, "overloaded_error"));
        assert_eq!(err.kind, ErrorKind::Upstream);
        assert!(err.message.contains("529"));
        assert!(err.message.contains("overloaded_error"));
    }

    #[test]
    fn upstream_detail_is_truncated() {
        let long_body = "x".repeat(5000);
        let err = classify_failure(Vendor::Google, status(500, &long_body));
        assert!(err.message.chars().count() < 300);
    }

    #[test]
    fn vendor_error_text_is_redacted() {
        let err = classify_failure(
            Vendor::OpenAi,
            status(500, "request with key sk-proj-superSecret123 failed"),
        );
        assert!(!err.message.contains("sk-proj-superSecret123"));
        assert!(err.message.contains("[redacted]"));
    }

    #[test]
    fn network_failures_are_upstream() {
        let err = classify_failure(
            Vendor::Xai,
            CallFailure::Network {
                reason: "connection reset by peer".into(),
            },
        );
        assert_eq!(err.kind, ErrorKind::Upstream);
        assert!(err.message.contains("xAI"));
    }

    #[test]
    fn kind_wire_names_are_stable() {
        assert_eq!(ErrorKind::InvalidCredential.as_str(), "invalid_credential");
        assert_eq!(
            serde_json::to_string(&ErrorKind::RateLimited).unwrap(),
            "\"rate_limited\""
        );
    }
}
