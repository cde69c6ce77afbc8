//! BYOK credential handling.
//!
//! Every user owns their vendor API keys.  The persisted form is a single
//! opaque blob per user: today a JSON object mapping vendor names to secrets,
//! historically a bare secret string from when only one vendor existed.
//! [`KeyRing::decode`] accepts both forever; credential records are a user
//! asset and old rows must keep decoding after every format migration.
//!
//! Key rings are rebuilt from the blob on each request and dropped at the end
//! of it.  Nothing in this crate caches secrets across requests, and nothing
//! here (including `Debug` output) prints secret material.

pub mod redact;

use std::collections::BTreeMap;

use copyforge_catalog::Vendor;

pub use redact::redact_secrets;

/// A user's decoded vendor keys for the duration of one request.
#[derive(Clone, Default)]
pub struct KeyRing {
    entries: BTreeMap<Vendor, String>,
}

impl KeyRing {
    /// Decode a persisted credential blob.
    ///
    /// Three shapes are accepted, in order:
    ///
    /// 1. A JSON object: every property named after a known vendor becomes an
    ///    entry; unrecognized properties and non-string values are ignored.
    /// 2. Anything else non-empty: the whole raw value is taken as the legacy
    ///    single-vendor secret (OpenAI).
    /// 3. Empty or whitespace-only input: an empty ring.
    ///
    /// This function has no failure mode.  A malformed blob is by definition
    /// a legacy bare-string secret, never an error.
    pub fn decode(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }

        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(raw) {
            let mut entries = BTreeMap::new();
            for (name, value) in &map {
                let Some(vendor) = Vendor::from_key(name) else {
                    tracing::debug!(key = %name, "ignoring unrecognized vendor key in credential blob");
                    continue;
                };
                if let Some(secret) = value.as_str() {
                    if !secret.is_empty() {
                        entries.insert(vendor, secret.to_owned());
                    }
                }
            }
            return Self { entries };
        }

        // Legacy form: the blob predates the structured format and is the
        // bare secret for the original single vendor.
        let mut entries = BTreeMap::new();
        entries.insert(Vendor::OpenAi, raw.to_owned());
        Self { entries }
    }

    /// The secret configured for `vendor`, if any.
    pub fn get(&self, vendor: Vendor) -> Option<&str> {
        self.entries.get(&vendor).map(String::as_str)
    }

    /// Whether no vendor has a key configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The vendors that have a key configured, in stable order.
    pub fn vendors(&self) -> impl Iterator<Item = Vendor> + '_ {
        self.entries.keys().copied()
    }

    /// Build a ring with a single entry.  Intended for tests and tooling.
    pub fn with_key(vendor: Vendor, secret: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(vendor, secret.into());
        Self { entries }
    }
}

impl std::fmt::Debug for KeyRing {
    /// Lists configured vendors only; secrets never reach log output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing")
            .field("vendors", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_blob_decodes_recognized_vendors() {
        let ring = KeyRing::decode(r#"{"openai":"sk-abc","anthropic":"sk-ant-xyz"}"#);
        assert_eq!(ring.get(Vendor::OpenAi), Some("sk-abc"));
        assert_eq!(ring.get(Vendor::Anthropic), Some("sk-ant-xyz"));
        assert_eq!(ring.get(Vendor::Google), None);
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let ring = KeyRing::decode(r#"{"openai":"sk-abc","cohere":"co-123","note":"hi"}"#);
        assert_eq!(ring.vendors().collect::<Vec<_>>(), vec![Vendor::OpenAi]);
    }

    #[test]
    fn non_string_values_are_ignored() {
        let ring = KeyRing::decode(r#"{"openai":42,"google":"AIza-test"}"#);
        assert_eq!(ring.get(Vendor::OpenAi), None);
        assert_eq!(ring.get(Vendor::Google), Some("AIza-test"));
    }

    #[test]
    fn bare_string_is_legacy_openai_secret() {
        let ring = KeyRing::decode("sk-legacy-key-from-2023");
        assert_eq!(ring.get(Vendor::OpenAi), Some("sk-legacy-key-from-2023"));
        assert_eq!(ring.vendors().count(), 1);
    }

    #[test]
    fn malformed_json_is_treated_as_legacy_secret() {
        let ring = KeyRing::decode(r#"{"openai": unterminated"#);
        assert_eq!(ring.get(Vendor::OpenAi), Some(r#"{"openai": unterminated"#));
    }

    #[test]
    fn json_non_object_is_treated_as_legacy_secret() {
        let ring = KeyRing::decode(r#"["sk-abc"]"#);
        assert_eq!(ring.get(Vendor::OpenAi), Some(r#"["sk-abc"]"#));
    }

    #[test]
    fn empty_blob_yields_empty_ring() {
        assert!(KeyRing::decode("").is_empty());
        assert!(KeyRing::decode("   \n").is_empty());
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let ring = KeyRing::decode(r#"{"openai":"sk-super-secret"}"#);
        let debug = format!("{ring:?}");
        assert!(!debug.contains("sk-super-secret"));
        assert!(debug.contains("OpenAi"));
    }
}
