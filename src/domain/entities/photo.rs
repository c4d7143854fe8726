//! Gallery photo entity.

use serde::{Deserialize, Serialize};

/// Height in pixels every card is laid out at.
pub const FIXED_HEIGHT: u32 = 250;

/// Unique identifier for a listed photo.
///
/// The listing API returns ids as strings, but the gallery orders them by
/// their numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoId(pub String);

/// Ordering key for a [`PhotoId`]: numeric ids first, by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PhotoSortKey {
    /// Id parsed as an unsigned integer.
    Numeric(u64),
    /// Id that is not a plain unsigned integer.
    Opaque,
}

impl PhotoId {
    /// Creates a new id from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value, if the id is one.
    #[must_use]
    pub fn numeric(&self) -> Option<u64> {
        self.0.trim().parse().ok()
    }

    /// Returns the key the gallery sorts by.
    #[must_use]
    pub fn sort_key(&self) -> PhotoSortKey {
        self.numeric()
            .map_or(PhotoSortKey::Opaque, PhotoSortKey::Numeric)
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PhotoId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Width in pixels of a card rendered at `fixed_height`, keeping the aspect
/// ratio of the original. A zero height is treated as a square.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn display_width(width: u32, height: u32, fixed_height: u32) -> u32 {
    if height == 0 {
        return fixed_height;
    }
    let ratio = f64::from(width) / f64::from(height);
    (ratio * f64::from(fixed_height)).round() as u32
}

/// A photo in the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    id: PhotoId,
    author: String,
    width: u32,
    height: u32,
    display_url: String,
    loaded: bool,
}

impl Photo {
    /// Creates a photo that has not been displayed yet.
    #[must_use]
    pub fn new(id: impl Into<PhotoId>, author: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            width,
            height,
            display_url: String::new(),
            loaded: false,
        }
    }

    /// Sets the URL the card image is fetched from.
    #[must_use]
    pub fn with_display_url(mut self, url: impl Into<String>) -> Self {
        self.display_url = url.into();
        self
    }

    #[must_use]
    pub const fn id(&self) -> &PhotoId {
        &self.id
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Original width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Original height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn display_url(&self) -> &str {
        &self.display_url
    }

    /// Returns whether the card image has finished loading.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Marks the card image as loaded. There is no way back.
    pub const fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Card width at the given fixed height.
    #[must_use]
    pub fn display_width(&self, fixed_height: u32) -> u32 {
        display_width(self.width, self.height, fixed_height)
    }
}
