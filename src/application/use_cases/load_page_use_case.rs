//! Page loading use case.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::dto::PageRequest;
use crate::domain::entities::{FIXED_HEIGHT, Photo, display_width};
use crate::domain::errors::SourceError;
use crate::domain::ports::{ImageSourcePort, PhotoRecord};

/// Fetches a page and turns listing records into gallery photos.
pub struct LoadPageUseCase {
    source: Arc<dyn ImageSourcePort>,
    fixed_height: u32,
}

impl LoadPageUseCase {
    /// Creates new use case laying cards out at the default height.
    #[must_use]
    pub fn new(source: Arc<dyn ImageSourcePort>) -> Self {
        Self {
            source,
            fixed_height: FIXED_HEIGHT,
        }
    }

    /// Sets the card height display URLs are sized for.
    #[must_use]
    pub const fn with_fixed_height(mut self, fixed_height: u32) -> Self {
        self.fixed_height = fixed_height;
        self
    }

    /// Runs one fetch.
    ///
    /// # Errors
    /// Returns the source error unchanged; nothing is retried.
    pub async fn execute(&self, request: PageRequest) -> Result<Vec<Photo>, SourceError> {
        let records = self
            .source
            .fetch_page(request.page, request.limit)
            .await
            .inspect_err(|e| warn!(page = request.page, error = %e, "Listing fetch failed"))?;

        debug!(page = request.page, count = records.len(), "Listing fetched");

        Ok(records
            .into_iter()
            .map(|record| self.to_photo(record))
            .collect())
    }

    fn to_photo(&self, record: PhotoRecord) -> Photo {
        let id = record.photo_id();
        let width = display_width(record.width, record.height, self.fixed_height);
        let url = self.source.image_url(&id, width, self.fixed_height);

        Photo::new(id, record.author, record.width, record.height).with_display_url(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PhotoId;
    use crate::domain::ports::MockImageSourcePort;
    use mockall::predicate::eq;

    fn url_template(id: &PhotoId, width: u32, height: u32) -> String {
        format!("https://picsum.photos/id/{id}/{width}/{height}")
    }

    #[tokio::test]
    async fn test_records_become_photos_with_display_urls() {
        let mut source = MockImageSourcePort::new();
        source
            .expect_fetch_page()
            .with(eq(1), eq(25))
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    PhotoRecord::new("0", "Alejandro Escamilla", 5000, 3333),
                    PhotoRecord::new("1", "Alejandro Escamilla", 3333, 5000),
                ])
            });
        source.expect_image_url().returning(url_template);

        let use_case = LoadPageUseCase::new(Arc::new(source));
        let photos = use_case.execute(PageRequest::new(1)).await.unwrap();

        assert_eq!(photos.len(), 2);
        assert_eq!(
            photos[0].display_url(),
            "https://picsum.photos/id/0/375/250"
        );
        assert_eq!(
            photos[1].display_url(),
            "https://picsum.photos/id/1/167/250"
        );
        assert!(photos.iter().all(|p| !p.is_loaded()));
    }

    #[tokio::test]
    async fn test_error_is_passed_through() {
        let mut source = MockImageSourcePort::new();
        source
            .expect_fetch_page()
            .returning(|_, _| Err(SourceError::transport(503, "Service Unavailable")));

        let use_case = LoadPageUseCase::new(Arc::new(source));
        let err = use_case.execute(PageRequest::new(4)).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_custom_fixed_height() {
        let mut source = MockImageSourcePort::new();
        source
            .expect_fetch_page()
            .returning(|_, _| Ok(vec![PhotoRecord::new("3", "a", 400, 200)]));
        source.expect_image_url().returning(url_template);

        let use_case = LoadPageUseCase::new(Arc::new(source)).with_fixed_height(100);
        let photos = use_case.execute(PageRequest::new(1)).await.unwrap();

        assert_eq!(photos[0].display_url(), "https://picsum.photos/id/3/200/100");
    }
}
