//! Lorem Picsum listing client.

mod client;

pub use client::{PICSUM_BASE, PicsumClient, parse_listing, status_error};
