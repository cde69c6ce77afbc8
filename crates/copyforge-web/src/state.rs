//! Shared per-server state.

use copyforge_dispatch::Dispatcher;

/// State shared across all request handlers.
///
/// Everything here is read-only after startup; credentials arrive inside
/// each request and are never stored on the state.
pub struct AppState {
    /// The vendor dispatcher shared by every generation request.
    pub dispatcher: Dispatcher,

    /// Shared secret for verifying billing webhook signatures.  `None`
    /// disables the webhook endpoint.
    pub webhook_secret: Option<String>,
}
