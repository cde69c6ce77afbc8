//! Router composition and server startup.

use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use copyforge_dispatch::Dispatcher;

use crate::state::AppState;
use crate::{WebConfig, api, webhook};

/// Errors raised while starting or running the web server.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Binding the listener or serving connections failed.
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The copyforge HTTP server.
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new server around a dispatcher.
    pub fn new(config: WebConfig, dispatcher: Dispatcher, webhook_secret: Option<String>) -> Self {
        let state = Arc::new(AppState {
            dispatcher,
            webhook_secret,
        });
        Self { config, state }
    }

    /// Build the router.  Split out so tests can drive it without a socket.
    pub fn router(state: Arc<AppState>) -> Router {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
            .allow_origin(Any);

        Router::new()
            .route("/api/status", get(api::status))
            .route("/api/models", get(api::models))
            .route("/api/skills", get(api::skills))
            .route("/api/generate", post(api::generate))
            .route("/api/billing/webhook", post(webhook::receive))
            .layer(cors)
            .with_state(state)
    }

    /// Bind and serve until the process exits.
    pub async fn serve(self) -> Result<(), WebError> {
        let router = Self::router(self.state);
        let listener =
            tokio::net::TcpListener::bind((self.config.bind_addr.as_str(), self.config.port))
                .await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            port = self.config.port,
            "copyforge web server listening"
        );

        axum::serve(listener, router).await?;
        Ok(())
    }
}
