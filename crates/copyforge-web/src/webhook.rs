//! Billing webhook verification.
//!
//! The payment provider signs each webhook delivery with a shared secret:
//! the `X-Copyforge-Signature` header carries `t=<unix>,v1=<hex>` where the
//! hex digest is HMAC-SHA256 over `"{t}.{body}"`.  Verification uses
//! `ring`'s constant-time comparison, and the timestamp must fall within a
//! fixed tolerance to blunt replay.
//!
//! Event handling beyond acknowledgement belongs to the payment provider
//! integration upstream; this endpoint validates, logs, and acks.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use ring::hmac;
use serde_json::json;

use crate::state::AppState;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-copyforge-signature";

/// Accepted clock skew between the provider and this service.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Why a delivery was rejected.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WebhookError {
    /// The signature header is absent or not in `t=…,v1=…` form.
    #[error("missing or malformed signature header")]
    MalformedHeader,
    /// The signed timestamp is outside the accepted tolerance.
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,
    /// The digest does not match the payload.
    #[error("signature mismatch")]
    BadSignature,
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify a webhook delivery signature.
///
/// `now_unix` is injected so the tolerance window is testable.
pub fn verify_signature(
    secret: &[u8],
    header: &str,
    body: &[u8],
    now_unix: i64,
) -> Result<(), WebhookError> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(WebhookError::MalformedHeader);
        };
        match key {
            "t" => timestamp = Some(value.parse().map_err(|_| WebhookError::MalformedHeader)?),
            "v1" => signature = Some(decode_hex(value)?),
            // Future scheme versions are ignored, not rejected.
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    let signature = signature.ok_or(WebhookError::MalformedHeader)?;

    if (now_unix - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(WebhookError::StaleTimestamp);
    }

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let mut signed = Vec::with_capacity(body.len() + 16);
    signed.extend_from_slice(timestamp.to_string().as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(body);

    hmac::verify(&key, &signed, &signature).map_err(|_| WebhookError::BadSignature)
}

/// Sign a payload the way the provider does.  Used by tests and tooling.
pub fn sign(secret: &[u8], body: &[u8], timestamp: i64) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let mut signed = Vec::with_capacity(body.len() + 16);
    signed.extend_from_slice(timestamp.to_string().as_bytes());
    signed.push(b'.');
    signed.extend_from_slice(body);

    let tag = hmac::sign(&key, &signed);
    let hex: String = tag.as_ref().iter().map(|b| format!("{b:02x}")).collect();
    format!("t={timestamp},v1={hex}")
}

fn decode_hex(s: &str) -> Result<Vec<u8>, WebhookError> {
    if s.is_empty() || s.len() % 2 != 0 {
        return Err(WebhookError::MalformedHeader);
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or(WebhookError::MalformedHeader)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Receive a billing webhook delivery.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = &state.webhook_secret else {
        tracing::warn!("billing webhook received but no secret is configured");
        return (
            StatusCode::NOT_IMPLEMENTED,
            Json(json!({ "error": "webhook not configured" })),
        )
            .into_response();
    };

    let Some(header) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing signature header" })),
        )
            .into_response();
    };

    let now_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();

    match verify_signature(secret.as_bytes(), header, &body, now_unix) {
        Ok(()) => {
            // The event type is logged for operators; subscription state
            // itself lives with the payment provider integration.
            let event_type = serde_json::from_slice::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["type"].as_str().map(String::from))
                .unwrap_or_else(|| "unknown".to_owned());
            tracing::info!(event_type = %event_type, "billing webhook accepted");

            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(WebhookError::MalformedHeader) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "malformed signature header" })),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(reason = %err, "billing webhook rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "signature verification failed" })),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test_secret";
    const BODY: &[u8] = br#"{"type":"subscription.updated","plan":"pro"}"#;
    const NOW: i64 = 1_754_000_000;

    #[test]
    fn valid_signature_verifies() {
        let header = sign(SECRET, BODY, NOW);
        assert_eq!(verify_signature(SECRET, &header, BODY, NOW), Ok(()));
    }

    #[test]
    fn skewed_but_tolerated_timestamp_verifies() {
        let header = sign(SECRET, BODY, NOW - 200);
        assert_eq!(verify_signature(SECRET, &header, BODY, NOW), Ok(()));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = sign(SECRET, BODY, NOW);
        let tampered = br#"{"type":"subscription.updated","plan":"enterprise"}"#;
        assert_eq!(
            verify_signature(SECRET, &header, tampered, NOW),
            Err(WebhookError::BadSignature)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let header = sign(b"whsec_other", BODY, NOW);
        assert_eq!(
            verify_signature(SECRET, &header, BODY, NOW),
            Err(WebhookError::BadSignature)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let header = sign(SECRET, BODY, NOW - 10_000);
        assert_eq!(
            verify_signature(SECRET, &header, BODY, NOW),
            Err(WebhookError::StaleTimestamp)
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for header in ["", "t=abc,v1=00", "v1=00ff", "t=123", "t=123,v1=xyz", "t=123,v1=0f0"] {
            assert_eq!(
                verify_signature(SECRET, header, BODY, NOW),
                Err(WebhookError::MalformedHeader),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn unknown_scheme_versions_are_ignored() {
        let header = format!("{},v2=deadbeef", sign(SECRET, BODY, NOW));
        assert_eq!(verify_signature(SECRET, &header, BODY, NOW), Ok(()));
    }
}
