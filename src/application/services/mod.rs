pub mod gallery;
pub mod sentinel;

pub use gallery::{Gallery, GalleryConfig, GalleryPhase};
pub use sentinel::{Sentinel, SentinelConfig, SentinelSubscription, visibility_ratio};
