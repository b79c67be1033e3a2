//! Portfolio server - HTTP backend for the retro portfolio site
//!
//! Serves the scripted terminal (`/command-prompt`) and the GitHub
//! repository proxy (`/github/{username}/repositories`).

mod github;
mod processor;
mod rpc;
mod state;
mod table;

use anyhow::{Context, Result};
use clap::Parser;
use github::{GithubClient, GithubConfig};
use portfolio_protocol::{COMMAND_PROMPT_PATH, DEFAULT_SERVER_ADDR};
use processor::CommandProcessor;
use state::ServerState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use table::CommandTable;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "portfolio-server", about = "Retro portfolio HTTP backend")]
struct Cli {
    /// Listen address
    #[arg(long, default_value = DEFAULT_SERVER_ADDR)]
    listen: String,

    /// Command table to use instead of the built-in one (TOML)
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Base URL of the GitHub REST API
    #[arg(long, default_value = github::DEFAULT_GITHUB_API_URL)]
    github_api_url: String,

    /// Timeout for GitHub API requests in milliseconds
    #[arg(long, default_value_t = github::DEFAULT_TIMEOUT_MS)]
    github_timeout_ms: u64,

    /// User-Agent sent to the GitHub API
    #[arg(long, default_value = github::DEFAULT_USER_AGENT)]
    user_agent: String,
}

/// Build the axum router over the shared state
pub fn app(state: Arc<ServerState>) -> axum::Router {
    axum::Router::new()
        .route(
            COMMAND_PROMPT_PATH,
            axum::routing::get(rpc::get_command_prompt).post(rpc::post_command_prompt),
        )
        .route(
            "/github/{username}/repositories",
            axum::routing::get(rpc::get_repositories),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let table = match &cli.commands {
        Some(path) => CommandTable::load(path)
            .with_context(|| format!("Failed to load command table {:?}", path))?,
        None => CommandTable::builtin().context("Built-in command table is invalid")?,
    };
    info!("Loaded command table with {} commands", table.command_count());

    let github = GithubClient::new(GithubConfig {
        api_url: cli.github_api_url.clone(),
        user_agent: cli.user_agent.clone(),
        timeout: Duration::from_millis(cli.github_timeout_ms),
    })?;

    let state = Arc::new(ServerState::new(CommandProcessor::new(table), github));

    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", cli.listen))?;
    info!("Listening on {}", cli.listen);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server exiting");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down...");
    }
}
