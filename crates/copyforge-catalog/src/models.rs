//! Model catalog.
//!
//! Maps a model identifier string to the vendor that serves it, plus the
//! display metadata the model picker needs.  Resolution is total: an id that
//! is not in the catalog routes to the default vendor rather than failing,
//! so new model ids can roll out ahead of a catalog update without breaking
//! existing clients mid-deploy.  The default vendor's adapter rejects ids it
//! does not recognize with a clean classified error.

use serde::{Deserialize, Serialize};

/// The default vendor unrecognized model ids are routed to.
pub const DEFAULT_VENDOR: Vendor = Vendor::OpenAi;

/// The model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

// ---------------------------------------------------------------------------
// Vendor
// ---------------------------------------------------------------------------

/// An inference vendor copyforge can dispatch to.
///
/// `Xai` speaks the OpenAI Chat Completions wire format and differs only in
/// its base endpoint; the dispatcher reuses the OpenAI adapter for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// OpenAI Chat Completions API.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Google Gemini `generateContent` API.
    Google,
    /// xAI — OpenAI-compatible wire format, different base URL.
    Xai,
}

impl Vendor {
    /// The key this vendor uses in the persisted credential blob.
    pub fn as_key(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "openai",
            Vendor::Anthropic => "anthropic",
            Vendor::Google => "google",
            Vendor::Xai => "xai",
        }
    }

    /// Parse a credential-blob key into a vendor.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "openai" => Some(Vendor::OpenAi),
            "anthropic" => Some(Vendor::Anthropic),
            "google" => Some(Vendor::Google),
            "xai" => Some(Vendor::Xai),
            _ => None,
        }
    }

    /// Human-readable vendor name for user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "OpenAI",
            Vendor::Anthropic => "Anthropic",
            Vendor::Google => "Google",
            Vendor::Xai => "xAI",
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A single model catalog entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelInfo {
    /// Stable vendor-specific model identifier.
    pub id: &'static str,
    /// The vendor that serves this model.
    pub vendor: Vendor,
    /// Short display name.
    pub label: &'static str,
    /// One-line description for the picker UI.
    pub description: &'static str,
    /// Display group heading.
    pub group: &'static str,
}

/// The compiled-in model catalog, in display order.
static MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gpt-4o",
        vendor: Vendor::OpenAi,
        label: "GPT-4o",
        description: "Versatile flagship, strong all-round copy",
        group: "OpenAI",
    },
    ModelInfo {
        id: "gpt-4o-mini",
        vendor: Vendor::OpenAi,
        label: "GPT-4o mini",
        description: "Fast and inexpensive for short-form drafts",
        group: "OpenAI",
    },
    ModelInfo {
        id: "gpt-4.1",
        vendor: Vendor::OpenAi,
        label: "GPT-4.1",
        description: "Long-context model for brief-heavy campaigns",
        group: "OpenAI",
    },
    ModelInfo {
        id: "claude-sonnet-4-20250514",
        vendor: Vendor::Anthropic,
        label: "Claude Sonnet 4",
        description: "Balanced quality and speed, nuanced tone control",
        group: "Anthropic",
    },
    ModelInfo {
        id: "claude-3-5-haiku-20241022",
        vendor: Vendor::Anthropic,
        label: "Claude Haiku 3.5",
        description: "Quick iterations on headlines and variants",
        group: "Anthropic",
    },
    ModelInfo {
        id: "gemini-2.0-flash",
        vendor: Vendor::Google,
        label: "Gemini 2.0 Flash",
        description: "Low-latency drafts with a large context window",
        group: "Google",
    },
    ModelInfo {
        id: "gemini-1.5-pro",
        vendor: Vendor::Google,
        label: "Gemini 1.5 Pro",
        description: "Deeper reasoning for positioning and strategy copy",
        group: "Google",
    },
    ModelInfo {
        id: "grok-3",
        vendor: Vendor::Xai,
        label: "Grok 3",
        description: "Conversational voice with a current-events bent",
        group: "xAI",
    },
    ModelInfo {
        id: "grok-3-mini",
        vendor: Vendor::Xai,
        label: "Grok 3 mini",
        description: "Lightweight Grok tier for rapid variants",
        group: "xAI",
    },
];

/// All catalog entries, in display order.
pub fn all_models() -> &'static [ModelInfo] {
    MODELS
}

/// Look up a catalog entry by model id.
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

/// Resolve the vendor for a model id.
///
/// Total over all inputs: ids missing from the catalog resolve to
/// [`DEFAULT_VENDOR`].  The miss is logged so a typo'd id in a client is
/// observable, but it is not an error.
pub fn resolve_vendor(model_id: &str) -> Vendor {
    match find_model(model_id) {
        Some(m) => m.vendor,
        None => {
            tracing::debug!(model_id, vendor = %DEFAULT_VENDOR, "model id not in catalog, using default vendor");
            DEFAULT_VENDOR
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_ids() {
        assert_eq!(resolve_vendor("gpt-4o"), Vendor::OpenAi);
        assert_eq!(resolve_vendor("claude-sonnet-4-20250514"), Vendor::Anthropic);
        assert_eq!(resolve_vendor("gemini-2.0-flash"), Vendor::Google);
        assert_eq!(resolve_vendor("grok-3"), Vendor::Xai);
    }

    #[test]
    fn unknown_id_falls_back_to_default_vendor() {
        assert_eq!(resolve_vendor("gpt-99-turbo-preview"), DEFAULT_VENDOR);
        assert_eq!(resolve_vendor(""), DEFAULT_VENDOR);
        assert_eq!(resolve_vendor("???"), DEFAULT_VENDOR);
    }

    #[test]
    fn default_model_is_in_catalog() {
        let model = find_model(DEFAULT_MODEL).expect("default model must be listed");
        assert_eq!(model.vendor, DEFAULT_VENDOR);
    }

    #[test]
    fn catalog_ids_are_unique() {
        for (i, a) in MODELS.iter().enumerate() {
            for b in &MODELS[i + 1..] {
                assert_ne!(a.id, b.id, "duplicate model id {}", a.id);
            }
        }
    }

    #[test]
    fn vendor_key_roundtrip() {
        for vendor in [Vendor::OpenAi, Vendor::Anthropic, Vendor::Google, Vendor::Xai] {
            assert_eq!(Vendor::from_key(vendor.as_key()), Some(vendor));
        }
        assert_eq!(Vendor::from_key("mistral"), None);
    }

    #[test]
    fn vendor_serializes_to_blob_key() {
        let json = serde_json::to_string(&Vendor::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }
}
