use std::io::stdout;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use crossterm::ExecutableCommand;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use scrollery::infrastructure::{AppConfig, CliArgs, PicsumClient, StorageManager};
use scrollery::presentation::App;
use scrollery::presentation::widgets::ImageManager;

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

    let mut config = match StorageManager::new() {
        Ok(storage) => storage.load_config(args.config.as_deref())?,
        Err(e) => {
            eprintln!("{e}; using default configuration");
            AppConfig::default()
        }
    };
    config.merge_with_args(args);

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = load_config()?;
    init_logging(&config)?;

    info!(version = scrollery::VERSION, "Starting {}", scrollery::NAME);

    let source = Arc::new(PicsumClient::with_options(
        config.source.base_url.clone(),
        &config.source.user_agent,
        config.source.timeout_secs,
    )?);

    let mut terminal = ratatui::init();
    if config.mouse {
        stdout().execute(EnableMouseCapture)?;
    }

    let result = match App::new(source, &config, ImageManager::new()) {
        Ok(app) => app.run(&mut terminal).await,
        Err(e) => Err(e.into()),
    };

    if config.mouse
        && let Err(e) = stdout().execute(DisableMouseCapture)
    {
        warn!(error = %e, "Failed to release mouse capture");
    }
    ratatui::restore();

    result
}
