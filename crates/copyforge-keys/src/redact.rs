//! Secret redaction for error text.
//!
//! Vendor error bodies occasionally echo the credential that failed (OpenAI
//! includes a truncated key in its 401 payload, for example).  Everything
//! surfaced to callers or logs runs through [`redact_secrets`] first, which
//! masks any token shaped like a vendor secret.

use std::sync::OnceLock;

use regex::Regex;

/// Replacement text for masked secrets.
const MASK: &str = "[redacted]";

/// Token shapes that look like vendor secrets.
///
/// `sk-` covers both OpenAI and Anthropic (`sk-ant-`) keys; `AIza` is the
/// Google API key prefix; `xai-` is xAI's.  Eight trailing characters is
/// enough to avoid masking prose that merely mentions a prefix.
fn secret_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(sk-[A-Za-z0-9_-]{8,}|AIza[A-Za-z0-9_-]{8,}|xai-[A-Za-z0-9_-]{8,})")
            .expect("secret pattern is valid")
    })
}

/// Mask anything resembling a vendor secret in `text`.
pub fn redact_secrets(text: &str) -> String {
    secret_pattern().replace_all(text, MASK).into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
