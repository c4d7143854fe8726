//! Image source port definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::PhotoId;
use crate::domain::errors::SourceError;
use crate::domain::serde_utils::string_or_number;

/// Page size requested when the caller does not choose one.
pub const DEFAULT_PAGE_LIMIT: u32 = 25;

/// A photo as listed by the source, before the gallery derives display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    #[serde(with = "string_or_number")]
    pub id: String,
    pub author: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub download_url: String,
}

impl PhotoRecord {
    #[must_use]
    pub fn new(id: impl Into<String>, author: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            width,
            height,
            url: String::new(),
            download_url: String::new(),
        }
    }

    #[must_use]
    pub fn photo_id(&self) -> PhotoId {
        PhotoId::new(self.id.clone())
    }
}

/// Port for a paginated photo listing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageSourcePort: Send + Sync {
    /// Fetches one page of the listing. Failures are returned, never raised.
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Vec<PhotoRecord>, SourceError>;

    /// Builds the URL of a photo scaled to the given size. No network access.
    fn image_url(&self, id: &PhotoId, width: u32, height: u32) -> String;
}
