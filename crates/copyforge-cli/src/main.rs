//! CLI entry point for copyforge.
//!
//! This binary provides the `copyforge` command: the HTTP server plus small
//! catalog-inspection subcommands for operators.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use copyforge_dispatch::Dispatcher;
use copyforge_web::{WebConfig, WebServer};

mod config;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// copyforge — BYOK marketing-copy generation server.
#[derive(Parser)]
#[command(
    name = "copyforge",
    version,
    about = "copyforge — BYOK marketing-copy generation server",
    long_about = "Server-side core of the copyforge product: routes generation \
                  requests to the AI vendor that serves the requested model, \
                  using the caller's own API keys."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the model catalog.
    Models,

    /// Print the skill catalog.
    Skills,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config } => cmd_serve(config.as_deref()).await,
        Commands::Models => {
            cmd_models();
            Ok(())
        }
        Commands::Skills => {
            cmd_skills();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand: serve
// ---------------------------------------------------------------------------

async fn cmd_serve(config_path: Option<&Path>) -> Result<()> {
    init_tracing("info");

    let config = config::load(config_path)?;

    let webhook_secret = std::env::var("COPYFORGE_WEBHOOK_SECRET").ok();
    if webhook_secret.is_none() {
        warn!("COPYFORGE_WEBHOOK_SECRET not set; billing webhook disabled");
    }

    info!(bind = %config.bind, port = config.port, "starting copyforge");

    let web_config = WebConfig {
        bind_addr: config.bind,
        port: config.port,
    };
    let server = WebServer::new(web_config, Dispatcher::over_http(), webhook_secret);

    server.serve().await.context("web server exited with an error")
}

// ---------------------------------------------------------------------------
// Subcommands: models / skills
// ---------------------------------------------------------------------------

fn cmd_models() {
    let mut group = "";
    for model in copyforge_catalog::all_models() {
        if model.group != group {
            group = model.group;
            println!("{group}:");
        }
        println!("  {:<28} {}", model.id, model.description);
    }
}

fn cmd_skills() {
    for skill in copyforge_catalog::all_skills() {
        println!("{:<22} {}", skill.id, skill.name);
    }
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
