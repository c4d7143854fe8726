//! Async image loading orchestrator.
//!
//! Requests are queued newest-first and drained through a semaphore, so the
//! cards the user is looking at now win over ones requested a while ago.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tracing::{debug, error, warn};

use crate::domain::entities::{LoadedImage, PhotoId};

/// Message sent when an image finishes loading.
#[derive(Debug, Clone)]
pub struct ImageLoadedEvent {
    /// The photo the image belongs to.
    pub id: PhotoId,
    /// The loaded image, or the failure message.
    pub result: Result<LoadedImage, String>,
}

/// Errors raised while fetching or decoding a card image.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Configuration for the image loader.
#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    /// Maximum concurrent downloads.
    pub max_concurrent_downloads: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 4,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug)]
enum LoaderCommand {
    Load { id: PhotoId, url: String },
    Cancel { id: PhotoId },
}

/// Queues, downloads and decodes card images.
pub struct ImageLoader {
    request_tx: mpsc::UnboundedSender<LoaderCommand>,
    config: ImageLoaderConfig,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// State for the background worker loop.
struct WorkerState {
    /// Ids with a download in progress; a second request for one is dropped.
    in_flight: Arc<Mutex<HashSet<PhotoId>>>,
    event_tx: mpsc::UnboundedSender<ImageLoadedEvent>,
    http_client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    request_rx: mpsc::UnboundedReceiver<LoaderCommand>,
}

impl ImageLoader {
    /// Creates a new image loader and spawns its worker.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        config: ImageLoaderConfig,
        event_tx: &mpsc::UnboundedSender<ImageLoadedEvent>,
    ) -> Result<Self, ImageLoadError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ImageLoadError::Client(e.to_string()))?;

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_downloads.max(1)));

        let worker_state = WorkerState {
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            event_tx: event_tx.clone(),
            http_client,
            semaphore,
            request_rx,
        };

        tokio::spawn(Self::run_worker_loop(worker_state));

        Ok(Self { request_tx, config })
    }

    /// Worker loop to handle download requests and throttling.
    async fn run_worker_loop(mut state: WorkerState) {
        let mut queue: VecDeque<(PhotoId, String)> = VecDeque::new();

        loop {
            tokio::select! {
                cmd = state.request_rx.recv() => {
                    match cmd {
                        Some(LoaderCommand::Load { id, url }) => {
                            if !queue.iter().any(|(qid, _)| *qid == id) {
                                queue.push_front((id, url));
                            }
                        }
                        Some(LoaderCommand::Cancel { id }) => {
                            queue.retain(|(qid, _)| *qid != id);
                        }
                        None => break,
                    }
                }
                Ok(permit) = state.semaphore.clone().acquire_owned(), if !queue.is_empty() => {
                    if let Some((id, url)) = queue.pop_front() {
                        let in_flight = state.in_flight.clone();
                        let event_tx = state.event_tx.clone();
                        let http_client = state.http_client.clone();

                        tokio::spawn(async move {
                            if !in_flight.lock().await.insert(id.clone()) {
                                debug!(id = %id, "Image already downloading");
                                return;
                            }

                            let result = load_image(&http_client, &id, &url)
                                .await
                                .map_err(|e| e.to_string());

                            in_flight.lock().await.remove(&id);

                            if event_tx.send(ImageLoadedEvent { id, result }).is_err() {
                                debug!("Image event receiver dropped");
                            }
                            drop(permit);
                        });
                    }
                }
            }
        }

        debug!("Image loader worker stopped");
    }

    /// Starts loading an image asynchronously.
    /// The result will be sent via the event channel.
    pub fn load_async(&self, id: PhotoId, url: String) {
        if let Err(e) = self.request_tx.send(LoaderCommand::Load { id, url }) {
            error!("Failed to send load request: {}", e);
        }
    }

    /// Queues several images at once.
    pub fn load_batch(&self, images: Vec<(PhotoId, String)>) {
        for (id, url) in images {
            self.load_async(id, url);
        }
    }

    /// Drops a queued load that has not started yet.
    pub fn cancel(&self, id: &PhotoId) {
        if let Err(e) = self
            .request_tx
            .send(LoaderCommand::Cancel { id: id.clone() })
        {
            error!("Failed to send cancel request: {}", e);
        }
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Bytes, ImageLoadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ImageLoadError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImageLoadError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    response
        .bytes()
        .await
        .map_err(|e| ImageLoadError::Request(format!("failed to read body: {e}")))
}

/// Decodes image bytes on the blocking pool.
///
/// # Errors
/// Returns a decode error if the bytes are not a supported image.
pub async fn decode(bytes: Bytes) -> Result<image::DynamicImage, ImageLoadError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| ImageLoadError::Decode(format!("decode task panicked: {e}")))?
        .map_err(|e| ImageLoadError::Decode(e.to_string()))
}

async fn load_image(
    client: &reqwest::Client,
    id: &PhotoId,
    url: &str,
) -> Result<LoadedImage, ImageLoadError> {
    debug!(id = %id, url = %url, "Downloading image");

    let bytes = download(client, url).await.inspect_err(|e| {
        warn!(id = %id, error = %e, "Image download failed");
    })?;
    let image = decode(bytes).await?;

    debug!(id = %id, width = image.width(), height = image.height(), "Image loaded");

    Ok(LoadedImage {
        id: id.clone(),
        image: Arc::new(image),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Bytes {
        let img = image::DynamicImage::new_rgb8(4, 3);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        Bytes::from(buf.into_inner())
    }

    #[tokio::test]
    async fn test_loader_creation() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(ImageLoaderConfig::default(), &tx);
        assert!(loader.is_ok());
    }

    #[tokio::test]
    async fn test_decode_png() {
        let img = decode(png_bytes()).await.unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[tokio::test]
    async fn test_decode_garbage_fails() {
        let err = decode(Bytes::from_static(b"not an image")).await.unwrap_err();
        assert!(matches!(err, ImageLoadError::Decode(_)));
    }

    #[tokio::test]
    async fn test_second_request_during_download_is_dropped() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/id/7/4/3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png_bytes().to_vec())
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(
            ImageLoaderConfig {
                max_concurrent_downloads: 2,
                timeout_secs: 5,
            },
            &tx,
        )
        .unwrap();
        let url = format!("{}/id/7/4/3", server.uri());

        loader.load_async(PhotoId::new("7"), url.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;
        loader.load_async(PhotoId::new("7"), url);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.id, PhotoId::new("7"));
        assert!(event.result.is_ok());

        let extra = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(extra.is_err(), "duplicate download reported an event");
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(
            ImageLoaderConfig {
                max_concurrent_downloads: 1,
                timeout_secs: 2,
            },
            &tx,
        )
        .unwrap();

        loader.load_async(PhotoId::new("7"), "http://127.0.0.1:1/id/7/10/10".into());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.id, PhotoId::new("7"));
        assert!(event.result.is_err());
    }
}
