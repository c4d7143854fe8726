mod image_source_port;

#[cfg(test)]
pub use image_source_port::MockImageSourcePort;
pub use image_source_port::{DEFAULT_PAGE_LIMIT, ImageSourcePort, PhotoRecord};
