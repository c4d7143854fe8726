use super::app_config::LogLevel;
use crate::domain::PageErrorPolicy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scrollery",
    version,
    about = "An infinite-scroll terminal photo gallery",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable mouse wheel scrolling.
    #[arg(long)]
    pub mouse: Option<bool>,

    /// Base URL of the listing API.
    #[arg(long, value_name = "URL", env = "SCROLLERY_BASE_URL")]
    pub base_url: Option<String>,

    /// Photos requested per page.
    #[arg(long, value_name = "N")]
    pub page_limit: Option<u32>,

    /// What scrolling to the end does after a page failed to load.
    #[arg(long, value_enum)]
    pub on_page_error: Option<PageErrorPolicy>,

    /// First page to request.
    #[arg(long, value_name = "N")]
    pub start_page: Option<u32>,
}
