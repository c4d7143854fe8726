//! Application configuration.

use crate::application::{GalleryConfig, SentinelConfig};
use crate::domain::PageErrorPolicy;
use crate::domain::entities::FIXED_HEIGHT;
use crate::domain::ports::DEFAULT_PAGE_LIMIT;
use crate::infrastructure::image::ImageLoaderConfig;
use crate::infrastructure::picsum::PICSUM_BASE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub(super) const APP_NAME: &str = "scrollery";
pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Enable mouse wheel scrolling.
    #[serde(default = "default_true")]
    pub mouse: bool,

    /// Listing endpoint settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Pagination settings.
    #[serde(default)]
    pub gallery: GallerySettings,

    /// End-of-content detection settings.
    #[serde(default)]
    pub sentinel: SentinelSettings,

    /// Card image settings.
    #[serde(default)]
    pub images: ImagesConfig,
}

/// Listing endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the listing API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Photos requested per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Pagination configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GallerySettings {
    /// What the next scroll trigger does after a failed page.
    #[serde(default)]
    pub on_page_error: PageErrorPolicy,

    /// First page requested.
    #[serde(default = "default_start_page")]
    pub start_page: u32,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            on_page_error: PageErrorPolicy::default(),
            start_page: default_start_page(),
        }
    }
}

/// End-of-content detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelSettings {
    /// Distance around the viewport, in pixels, that counts as visible.
    #[serde(default = "default_margin_px")]
    pub margin_px: u16,

    /// Fraction of the end marker that must be visible.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

impl Default for SentinelSettings {
    fn default() -> Self {
        Self {
            margin_px: default_margin_px(),
            threshold: default_threshold(),
        }
    }
}

/// Card image configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Card height in pixels.
    #[serde(default = "default_fixed_height")]
    pub fixed_height: u32,

    /// Maximum concurrent image downloads.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Card rows above and below the viewport whose images are loaded.
    #[serde(default = "default_load_buffer_rows")]
    pub load_buffer_rows: usize,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            fixed_height: default_fixed_height(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            load_buffer_rows: default_load_buffer_rows(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    PICSUM_BASE.to_string()
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("scrollery/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_start_page() -> u32 {
    1
}

fn default_margin_px() -> u16 {
    SentinelConfig::default().margin_px
}

fn default_threshold() -> f32 {
    SentinelConfig::default().threshold
}

fn default_fixed_height() -> u32 {
    FIXED_HEIGHT
}

fn default_max_concurrent_downloads() -> usize {
    4
}

fn default_load_buffer_rows() -> usize {
    2
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: CliArgs) {
        if let Some(config_path) = args.config {
            self.config = Some(config_path);
        }
        if let Some(log_path) = args.log_path {
            self.log_path = Some(log_path);
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(mouse) = args.mouse {
            self.mouse = mouse;
        }
        if let Some(base_url) = args.base_url {
            self.source.base_url = base_url;
        }
        if let Some(page_limit) = args.page_limit {
            self.source.page_limit = page_limit;
        }
        if let Some(policy) = args.on_page_error {
            self.gallery.on_page_error = policy;
        }
        if let Some(start_page) = args.start_page {
            self.gallery.start_page = start_page;
        }
    }

    /// Pagination settings for the gallery state machine.
    #[must_use]
    pub fn gallery_config(&self) -> GalleryConfig {
        GalleryConfig {
            page_limit: self.source.page_limit.max(1),
            start_page: self.gallery.start_page.max(1),
            on_page_error: self.gallery.on_page_error,
        }
    }

    /// Settings for the end-of-content sentinel.
    #[must_use]
    pub fn sentinel_config(&self) -> SentinelConfig {
        SentinelConfig {
            margin_px: self.sentinel.margin_px,
            threshold: self.sentinel.threshold.clamp(0.0, 1.0),
        }
    }

    /// Settings for the card image loader.
    #[must_use]
    pub fn image_loader_config(&self) -> ImageLoaderConfig {
        ImageLoaderConfig {
            max_concurrent_downloads: self.images.max_concurrent_downloads.max(1),
            timeout_secs: self.source.timeout_secs,
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("scrollery.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            mouse: true,
            source: SourceConfig::default(),
            gallery: GallerySettings::default(),
            sentinel: SentinelSettings::default(),
            images: ImagesConfig::default(),
        }
    }
}
