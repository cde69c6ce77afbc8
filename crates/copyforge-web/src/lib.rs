//! HTTP surface for copyforge.
//!
//! Exposes the dispatcher over a small REST API:
//!
//! - `POST /api/generate` — copy generation, JSON reply or SSE delta stream.
//! - `GET /api/models`, `GET /api/skills` — catalog listings for the UI.
//! - `GET /api/status` — health and version.
//! - `POST /api/billing/webhook` — payment-provider webhook with HMAC
//!   signature verification.
//!
//! This layer owns the mapping from [`copyforge_dispatch::ErrorKind`] to
//! HTTP statuses; the dispatcher stays transport-agnostic.

pub mod api;
pub mod server;
pub mod state;
pub mod webhook;

pub use server::WebServer;
pub use state::AppState;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: 8787,
        }
    }
}
