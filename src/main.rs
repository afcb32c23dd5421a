use std::io::stdout;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use libris::infrastructure::{
    AppConfig, CatalogClient, CliArgs, FetcherConfig, HttpCoverFetcher, StorageManager,
};
use libris::presentation::widgets::CoverRenderer;
use libris::presentation::{App, AppSettings};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let args = CliArgs::parse();
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

fn settings(config: &AppConfig) -> AppSettings {
    AppSettings {
        page_size: config.api.page_size,
        user_id: config.api.user_id,
        cover_options: config.covers.cover_options(),
        preload: config.covers.preload,
        preload_batch_size: config.covers.preload_batch_size,
        mouse: config.mouse,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_logging(&config)?;

    info!(version = libris::VERSION, api = %config.api.base_url, "Starting Libris");

    let client = Arc::new(CatalogClient::from_config(&config.api)?);
    let fetcher = Arc::new(HttpCoverFetcher::new(FetcherConfig::from(&config.covers))?);

    let mut terminal = ratatui::init();
    if config.mouse {
        execute!(stdout(), EnableMouseCapture)?;
    }

    // The graphics query reads stdin, so it runs before the event stream exists.
    let renderer = CoverRenderer::new();

    let app = App::new(
        client.clone(),
        client,
        fetcher,
        renderer,
        settings(&config),
    );
    let result = app.run(&mut terminal).await;

    if config.mouse {
        execute!(stdout(), DisableMouseCapture)?;
    }
    ratatui::restore();

    result
}
