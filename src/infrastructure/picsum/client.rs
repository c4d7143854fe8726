//! Lorem Picsum HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::domain::entities::PhotoId;
use crate::domain::errors::SourceError;
use crate::domain::ports::{ImageSourcePort, PhotoRecord};

/// Default listing host.
pub const PICSUM_BASE: &str = "https://picsum.photos";
const USER_AGENT: &str = concat!("scrollery/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Paginated listing client for the Lorem Picsum API.
#[derive(Debug, Clone)]
pub struct PicsumClient {
    client: Client,
    base_url: String,
}

impl PicsumClient {
    /// Creates new client with default base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new() -> Result<Self, SourceError> {
        Self::with_base_url(PICSUM_BASE)
    }

    /// Creates client with custom base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, SourceError> {
        Self::with_options(base_url, USER_AGENT, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates client with custom base URL, user agent and timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_options(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of one listing page.
    #[must_use]
    pub fn list_url(&self, page: u32, limit: u32) -> String {
        format!("{}/v2/list?page={page}&limit={limit}", self.base_url)
    }
}

/// Maps a non-success status to the error shown to the user.
#[must_use]
pub fn status_error(status: StatusCode) -> SourceError {
    SourceError::transport(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
    )
}

/// Decodes a listing body.
///
/// # Errors
/// Returns a parse error if the body is not a JSON array of photo records.
pub fn parse_listing(body: &[u8]) -> Result<Vec<PhotoRecord>, SourceError> {
    serde_json::from_slice(body).map_err(|e| SourceError::parse(e.to_string()))
}

#[async_trait]
impl ImageSourcePort for PicsumClient {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Vec<PhotoRecord>, SourceError> {
        let url = self.list_url(page, limit);

        debug!(url = %url, "Requesting listing page");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "Failed to reach listing endpoint");
            if e.is_timeout() {
                SourceError::network("request timed out")
            } else if e.is_connect() {
                SourceError::network("failed to connect to image source")
            } else {
                SourceError::network(e.to_string())
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            warn!(status = %status, page, "Listing endpoint returned an error");
            return Err(status_error(status));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Failed to read listing body");
            SourceError::network(e.to_string())
        })?;

        let records = parse_listing(&body).inspect_err(|e| {
            warn!(error = %e, "Failed to parse listing");
        })?;

        debug!(page, count = records.len(), "Listing page parsed");

        Ok(records)
    }

    fn image_url(&self, id: &PhotoId, width: u32, height: u32) -> String {
        format!("{}/id/{id}/{width}/{height}", self.base_url)
    }
}
