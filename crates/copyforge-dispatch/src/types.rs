//! Request and call types flowing through the dispatcher.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;

use copyforge_catalog::Vendor;

use crate::error::Result;

/// Fixed sampling temperature for all copy generation.
pub const TEMPERATURE: f32 = 0.75;

/// Fixed cap on generated output, in tokens.
pub const MAX_OUTPUT_TOKENS: u32 = 2000;

/// Maximum accepted user message length, in characters after trimming.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Timeout for one non-streaming vendor call.  The streaming path carries no
/// explicit timeout; it is bounded by consumer cancellation.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Inbound request
// ---------------------------------------------------------------------------

/// One inbound generation request, as handed over by the transport layer.
#[derive(Clone)]
pub struct GenerationRequest {
    /// The user's persisted credential blob, decoded fresh per request.
    pub credential_blob: String,

    /// The user's message (1..=4000 chars after trim).
    pub message: String,

    /// Selected skill ids; unknown ids are skipped.
    pub skills: Vec<String>,

    /// Requested model id; `None` selects the catalog default.
    pub model_id: Option<String>,
}

impl std::fmt::Debug for GenerationRequest {
    /// Omits the credential blob; it may contain secrets.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("message_chars", &self.message.chars().count())
            .field("skills", &self.skills)
            .field("model_id", &self.model_id)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Prepared vendor call
// ---------------------------------------------------------------------------

/// A fully resolved call, ready for a [`crate::transport::VendorClient`].
///
/// Produced only after every precondition has passed; holding one implies the
/// message is valid and a key exists for the vendor.
#[derive(Clone)]
pub struct CompletionCall {
    /// The vendor that will serve this call.
    pub vendor: Vendor,
    /// The model id to request.
    pub model: String,
    /// The user's secret for `vendor`.
    pub api_key: String,
    /// The composed system instruction.
    pub system: String,
    /// The trimmed user message.
    pub message: String,
}

impl std::fmt::Debug for CompletionCall {
    /// Omits the API key.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionCall")
            .field("vendor", &self.vendor)
            .field("model", &self.model)
            .field("message_chars", &self.message.chars().count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Streaming output
// ---------------------------------------------------------------------------

/// A classified stream of text deltas.
///
/// Items arrive in vendor order, one per delta, never coalesced.  The stream
/// ends after the vendor's final delta; a mid-stream vendor failure surfaces
/// as one terminal `Err` item.  Dropping the stream cancels the upstream
/// vendor connection.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;
