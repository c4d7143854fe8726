mod footer_bar;
pub mod gallery_grid;
mod image_state;
mod status_bar;

pub use footer_bar::FooterBar;
pub use gallery_grid::{CardSlot, CellSize, GalleryGrid, GalleryGridState, GridLayout, SCROLL_LINES};
pub use image_state::{Attachments, ImageAttachment, ImageManager, MEMORY_BUFFER_FACTOR};
pub use status_bar::{StatusBar, StatusLevel};
