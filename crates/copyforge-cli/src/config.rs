//! Server configuration.
//!
//! Layered lowest to highest: built-in defaults, then an optional TOML file,
//! then `COPYFORGE_*` environment variables.  The webhook secret is read from
//! the environment only and never lives in the config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Configuration for the `copyforge serve` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8787,
        }
    }
}

impl ServerConfig {
    /// Apply environment-variable overrides on top of the current values.
    fn apply_overrides(&mut self, bind: Option<String>, port: Option<String>) -> Result<()> {
        if let Some(bind) = bind {
            self.bind = bind;
        }
        if let Some(port) = port {
            self.port = port
                .parse()
                .with_context(|| format!("COPYFORGE_PORT is not a valid port: {port}"))?;
        }
        Ok(())
    }
}

/// Load configuration from an optional file plus the environment.
pub fn load(path: Option<&Path>) -> Result<ServerConfig> {
    let mut config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read config file {}", p.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config file {}", p.display()))?
        }
        None => ServerConfig::default(),
    };

    config.apply_overrides(
        std::env::var("COPYFORGE_BIND").ok(),
        std::env::var("COPYFORGE_PORT").ok(),
    )?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
