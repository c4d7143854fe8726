//! Scrollery - an infinite-scroll terminal photo gallery.
//!
//! This crate pages through the Lorem Picsum listing API as the user scrolls,
//! merging each page into a deduplicated, id-ordered card grid rendered with
//! the terminal's graphics protocol.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the gallery state machine and use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing the listing client, image loader and config.
pub mod infrastructure;
/// Presentation layer containing UI components and event handling.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "scrollery";
