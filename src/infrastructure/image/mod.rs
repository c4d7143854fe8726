//! Card image loading.
//!
//! Downloads display-sized images and decodes them off the UI loop with a
//! bounded number of concurrent requests. Nothing is cached here: decoded
//! images live with the card that asked for them.

pub mod loader;

pub use loader::{ImageLoadError, ImageLoadedEvent, ImageLoader, ImageLoaderConfig};
