//! Application layer with the gallery state machine, use cases and DTOs.

/// Data transfer objects.
pub mod dto;
/// Gallery state and pagination services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{PageOutcome, PageRequest};
pub use services::{Gallery, GalleryConfig, GalleryPhase, Sentinel, SentinelConfig};
pub use use_cases::LoadPageUseCase;
