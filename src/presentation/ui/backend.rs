use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::dto::PageRequest;
use crate::application::use_cases::LoadPageUseCase;
use crate::domain::entities::Photo;

/// Results the backend worker reports to the UI loop.
#[derive(Debug)]
pub enum Action {
    PageLoaded { page: u32, photos: Vec<Photo> },
    PageFailed { page: u32, error: String },
}

#[derive(Debug)]
pub enum BackendCommand {
    FetchPage(PageRequest),
}

/// Runs listing fetches off the UI task.
pub struct Backend {
    load_page: LoadPageUseCase,
    command_rx: mpsc::UnboundedReceiver<BackendCommand>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl Backend {
    pub fn new(
        load_page: LoadPageUseCase,
        command_rx: mpsc::UnboundedReceiver<BackendCommand>,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            load_page,
            command_rx,
            action_tx,
        }
    }

    pub async fn run(mut self) {
        info!("Backend worker started");
        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command).await;
        }
        info!("Backend worker stopped");
    }

    async fn handle_command(&self, command: BackendCommand) {
        match command {
            BackendCommand::FetchPage(request) => {
                let page = request.page;
                let action = match self.load_page.execute(request).await {
                    Ok(photos) => {
                        debug!(page, count = photos.len(), "Loaded page");
                        Action::PageLoaded { page, photos }
                    }
                    Err(e) => {
                        warn!(page, error = %e, "Failed to load page");
                        Action::PageFailed {
                            page,
                            error: e.to_string(),
                        }
                    }
                };
                if let Err(e) = self.action_tx.send(action) {
                    warn!(page, error = %e, "UI loop is gone, dropping page result");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::errors::SourceError;
    use crate::domain::ports::{MockImageSourcePort, PhotoRecord};

    fn spawn_backend(source: MockImageSourcePort) -> (
        mpsc::UnboundedSender<BackendCommand>,
        mpsc::UnboundedReceiver<Action>,
    ) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let backend = Backend::new(LoadPageUseCase::new(Arc::new(source)), command_rx, action_tx);
        tokio::spawn(backend.run());
        (command_tx, action_rx)
    }

    #[tokio::test]
    async fn test_fetch_page_reports_photos() {
        let mut source = MockImageSourcePort::new();
        source
            .expect_fetch_page()
            .withf(|page, limit| *page == 2 && *limit == 25)
            .returning(|_, _| Ok(vec![PhotoRecord::new("7", "Ann", 500, 250)]));
        source
            .expect_image_url()
            .returning(|id, w, h| format!("http://img/{id}/{w}/{h}"));

        let (tx, mut rx) = spawn_backend(source);
        tx.send(BackendCommand::FetchPage(PageRequest::new(2))).unwrap();

        match rx.recv().await.unwrap() {
            Action::PageLoaded { page, photos } => {
                assert_eq!(page, 2);
                assert_eq!(photos.len(), 1);
                assert_eq!(photos[0].display_url(), "http://img/7/500/250");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_message() {
        let mut source = MockImageSourcePort::new();
        source
            .expect_fetch_page()
            .returning(|_, _| Err(SourceError::transport(500, "Internal Server Error")));

        let (tx, mut rx) = spawn_backend(source);
        tx.send(BackendCommand::FetchPage(PageRequest::new(1))).unwrap();

        match rx.recv().await.unwrap() {
            Action::PageFailed { page, error } => {
                assert_eq!(page, 1);
                assert_eq!(error, "Failed to fetch images: 500 Internal Server Error");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_worker_survives_closed_ui_channel() {
        let mut source = MockImageSourcePort::new();
        source
            .expect_fetch_page()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let backend = Backend::new(LoadPageUseCase::new(Arc::new(source)), command_rx, action_tx);
        let handle = tokio::spawn(backend.run());

        drop(action_rx);
        command_tx
            .send(BackendCommand::FetchPage(PageRequest::new(1)))
            .unwrap();
        drop(command_tx);

        tokio_test::assert_ok!(handle.await);
    }

    #[tokio::test]
    async fn test_worker_stops_when_commands_close() {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (action_tx, _action_rx) = mpsc::unbounded_channel();
        let backend = Backend::new(
            LoadPageUseCase::new(Arc::new(MockImageSourcePort::new())),
            command_rx,
            action_tx,
        );
        let handle = tokio::spawn(backend.run());

        drop(command_tx);
        tokio_test::assert_ok!(handle.await);
    }
}
