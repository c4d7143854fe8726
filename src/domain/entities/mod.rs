//! Domain entity definitions.

mod image;
mod photo;

pub use image::{ImageStatus, LoadedImage};
pub use photo::{FIXED_HEIGHT, Photo, PhotoId, PhotoSortKey, display_width};
