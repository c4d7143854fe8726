//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Card image loading.
pub mod image;
/// Lorem Picsum listing client.
pub mod picsum;

pub use config::{AppConfig, CliArgs, ConfigError, LogLevel, StorageManager};
pub use image::{ImageLoadError, ImageLoadedEvent, ImageLoader, ImageLoaderConfig};
pub use picsum::PicsumClient;
