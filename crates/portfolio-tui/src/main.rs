use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use portfolio_core::{AssistantWidget, Config, ContentStore, GeminiClient};

mod app;
mod handler;
mod hero;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "portfolio", version)]
#[command(about = "Terminal portfolio with an embedded AI assistant")]
struct Cli {
    /// Portfolio content JSON to show instead of the built-in content
    #[arg(short, long)]
    content: Option<PathBuf>,
    /// Gemini model the assistant should use
    #[arg(short, long)]
    model: Option<String>,
    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(level: &str) -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("portfolio");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let log_path = log_dir.join("portfolio.log");
    let file = File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(log_path)
}

fn init_config() -> Result<()> {
    let config_path = Config::get_config_path()?;
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        let config_path = Config::new().save()?;
        println!("Wrote default config to {}", config_path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if cli.init_config {
        return init_config();
    }

    let config = Config::load().context("Failed to load config")?;
    let log_path = init_logging(config.log_level())?;
    info!(log = %log_path.display(), "Starting portfolio");

    let content_path = cli.content.or_else(|| config.content_path.clone());
    let content = ContentStore::load(content_path.as_deref()).await?;

    let mut settings = config.assistant_settings();
    if let Some(model) = cli.model {
        settings.model = model;
    }
    if settings.api_key.is_none() {
        warn!("No API key configured; the assistant will answer with its fallback message");
    }

    let client = GeminiClient::new(&settings).context("Failed to build HTTP client")?;
    let has_credential = client.has_credential();
    info!(model = client.model(), endpoint = %settings.endpoint, "Assistant configured");

    let assistant = AssistantWidget::new(Arc::new(client));
    let mut app = App::new(content, assistant, settings.model, has_credential);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    info!("Exiting");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        // A reply may have landed between ticks
        app.collect_reply();
    }

    Ok(())
}
