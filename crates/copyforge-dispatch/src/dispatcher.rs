//! The vendor dispatcher.
//!
//! One dispatch = decode the credential blob, resolve the vendor for the
//! model id, compose the system instruction, and invoke the vendor client in
//! the requested delivery mode.  All preconditions are enforced before any
//! network activity, and every vendor failure leaves this module already
//! classified.

use std::sync::Arc;

use futures::StreamExt;
use uuid::Uuid;

use copyforge_catalog::{DEFAULT_MODEL, resolve_vendor};
use copyforge_keys::KeyRing;

use crate::error::{DispatchError, Result, classify_failure};
use crate::prompt::compose_instruction;
use crate::transport::{HttpVendorClient, VendorClient};
use crate::types::{CompletionCall, DeltaStream, GenerationRequest, MAX_MESSAGE_CHARS};

/// Routes generation requests to vendor completion APIs.
///
/// Holds no per-request state; the catalogs are static and credentials live
/// only inside the request being dispatched.  Exactly one upstream vendor
/// call is opened per dispatch.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn VendorClient>,
}

impl Dispatcher {
    /// Create a dispatcher over any [`VendorClient`].
    pub fn new(client: Arc<dyn VendorClient>) -> Self {
        Self { client }
    }

    /// Create a dispatcher over the production HTTP client.
    pub fn over_http() -> Self {
        Self::new(Arc::new(HttpVendorClient::new()))
    }

    /// Validate the request and resolve it into a vendor call.
    ///
    /// Rejections here are guaranteed to happen before any network call.
    fn prepare(&self, req: &GenerationRequest) -> Result<CompletionCall> {
        let message = req.message.trim();
        if message.is_empty() {
            return Err(DispatchError::invalid_input("no message provided"));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(DispatchError::invalid_input(format!(
                "message too long (limit {MAX_MESSAGE_CHARS} characters)"
            )));
        }

        let keys = KeyRing::decode(&req.credential_blob);
        let model = req
            .model_id
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned());
        let vendor = resolve_vendor(&model);

        let Some(api_key) = keys.get(vendor) else {
            return Err(DispatchError::missing_credential(vendor));
        };

        Ok(CompletionCall {
            vendor,
            model,
            api_key: api_key.to_owned(),
            system: compose_instruction(&req.skills),
            message: message.to_owned(),
        })
    }

    /// Issue a non-streaming completion and return the generated text.
    pub async fn complete(&self, req: &GenerationRequest) -> Result<String> {
        let call = self.prepare(req)?;
        let vendor = call.vendor;
        let request_id = Uuid::now_v7();

        tracing::debug!(%request_id, vendor = %vendor, model = %call.model, "dispatching completion");

        let content = self
            .client
            .complete(call)
            .await
            .map_err(|f| classify_failure(vendor, f))?;

        if content.trim().is_empty() {
            tracing::warn!(%request_id, vendor = %vendor, "vendor returned empty content");
            return Err(DispatchError::empty_response(vendor));
        }

        tracing::debug!(%request_id, chars = content.chars().count(), "completion finished");
        Ok(content)
    }

    /// Open a streaming completion.
    ///
    /// Deltas are forwarded in vendor order; dropping the returned stream
    /// cancels the vendor call.
    pub async fn stream(&self, req: &GenerationRequest) -> Result<DeltaStream> {
        let call = self.prepare(req)?;
        let vendor = call.vendor;
        let request_id = Uuid::now_v7();

        tracing::debug!(%request_id, vendor = %vendor, model = %call.model, "opening completion stream");

        let raw = self
            .client
            .open_stream(call)
            .await
            .map_err(|f| classify_failure(vendor, f))?;

        Ok(raw
            .map(move |item| item.map_err(|f| classify_failure(vendor, f)))
            .boxed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
