//! Portfolio Terminal - Entry Point
//!
//! Interactive DOS-style prompt backed by the portfolio server.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use portfolio_terminal::{
    core::analytics::{AnalyticsSink, NullSink, TracingSink},
    CommandPromptApi, Config, PortfolioClient, Renderer, Session, Terminal,
};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Typed at the prompt to clear the screen locally
const LOCAL_CLEAR: &str = "!clear";

#[derive(Debug, Parser)]
#[command(name = "portfolio-terminal", version, about = "Retro portfolio command prompt")]
struct Cli {
    /// Server base URL, overriding the config file
    #[arg(long)]
    server: Option<String>,

    /// Config file path (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable ANSI colors and escape sequences
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List a GitHub user's public repositories through the server proxy
    Repos { username: String },
    /// Write the default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if let Some(Command::InitConfig) = cli.command {
        return init_config(&config_path);
    }

    let mut config = Config::load_from(&config_path)?;
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }
    debug!("Using server {}", config.server.base_url);

    let client = PortfolioClient::new(&config.server.base_url, config.server.timeout())
        .context("Failed to create server client")?;

    match cli.command {
        Some(Command::Repos { username }) => list_repositories(&client, &username).await,
        _ => run_prompt(client, config, !cli.no_color).await,
    }
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, Config::default_config_str())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn list_repositories(client: &PortfolioClient, username: &str) -> Result<()> {
    let repos = client
        .fetch_repositories(username)
        .await
        .with_context(|| format!("Failed to list repositories for {}", username))?;

    if repos.is_empty() {
        println!("{} has no public repositories", username);
    }
    for repo in repos {
        println!("{} ({} stars, {})", repo.name, repo.stargazers_count, repo.size);
        println!("    {}", repo.description);
        println!("    {}", repo.url);
    }
    Ok(())
}

async fn run_prompt<A: CommandPromptApi>(api: A, config: Config, color: bool) -> Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let ansi = color && std::io::stdout().is_terminal();

    let analytics: Arc<dyn AnalyticsSink> = if config.analytics.enabled {
        Arc::new(TracingSink)
    } else {
        Arc::new(NullSink)
    };
    let session = Session::new(config.terminal, analytics);
    info!(session = %session.id(), "Starting terminal session");

    let mut terminal = Terminal::new(api, session);
    let mut renderer = Renderer::new(interactive, ansi);
    let mut stdout = std::io::stdout();

    terminal.initialize().await;
    renderer.render_title(&mut stdout, terminal.session().title())?;
    renderer.render(&mut stdout, terminal.session().transcript())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let transcript = if line.trim() == LOCAL_CLEAR {
            terminal.session_mut().clear()
        } else {
            terminal.run_command(&line).await
        };
        renderer.render(&mut stdout, transcript)?;
    }

    writeln!(stdout)?;
    Ok(())
}
