//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Keybinding definitions.
pub mod keybinding;
/// Page error policy.
pub mod page_policy;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;

pub use entities::{Photo, PhotoId};
pub use errors::SourceError;
pub use page_policy::PageErrorPolicy;
pub use ports::{ImageSourcePort, PhotoRecord};
