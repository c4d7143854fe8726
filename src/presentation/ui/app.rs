//! Main application orchestrator.

use std::sync::Arc;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::layout::{Constraint, Layout};
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::dto::{PageOutcome, PageRequest};
use crate::application::services::{Gallery, Sentinel};
use crate::application::use_cases::LoadPageUseCase;
use crate::domain::PageErrorPolicy;
use crate::domain::keybinding::Action as KeyAction;
use crate::domain::ports::ImageSourcePort;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::image::{ImageLoadError, ImageLoadedEvent, ImageLoader};
use crate::presentation::events::{EventHandler, EventResult};
use crate::presentation::ui::backend::{Action, Backend, BackendCommand};
use crate::presentation::widgets::{
    FooterBar, GalleryGrid, GalleryGridState, ImageManager, SCROLL_LINES, StatusBar,
};

const LOADING_TEXT: &str = "Loading images...";
const EXHAUSTED_TEXT: &str = "No more images to load";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppState {
    Running,
    Exiting,
}

pub struct App {
    state: AppState,
    gallery: Gallery,
    sentinel: Sentinel,
    grid: GalleryGridState,
    image_manager: ImageManager,
    image_loader: ImageLoader,
    image_rx: mpsc::UnboundedReceiver<ImageLoadedEvent>,
    events: EventHandler,
    command_tx: mpsc::UnboundedSender<BackendCommand>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    load_buffer_rows: usize,
}

impl App {
    /// Builds the app and spawns its backend worker.
    ///
    /// # Errors
    /// Returns error if the image loader's HTTP client cannot be created.
    pub fn new(
        source: Arc<dyn ImageSourcePort>,
        config: &AppConfig,
        image_manager: ImageManager,
    ) -> Result<Self, ImageLoadError> {
        let (image_tx, image_rx) = mpsc::unbounded_channel();
        let image_loader = ImageLoader::new(config.image_loader_config(), &image_tx)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let load_page = LoadPageUseCase::new(source).with_fixed_height(config.images.fixed_height);
        tokio::spawn(Backend::new(load_page, command_rx, action_tx).run());

        let grid = GalleryGridState::new(image_manager.cell_size(), config.images.fixed_height);

        Ok(Self {
            state: AppState::Running,
            gallery: Gallery::new(config.gallery_config()),
            sentinel: Sentinel::new(config.sentinel_config()),
            grid,
            image_manager,
            image_loader,
            image_rx,
            events: EventHandler::new(config.mouse),
            command_tx,
            action_rx,
            load_buffer_rows: config.images.load_buffer_rows,
        })
    }

    /// # Errors
    /// Returns error if drawing to the terminal fails.
    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        info!(
            page = self.gallery.cursor(),
            policy = %self.gallery.policy(),
            "Starting gallery"
        );
        let request = self.gallery.begin_fetch();
        self.request_page(request);

        self.run_event_loop(terminal).await?;

        info!(photos = self.gallery.len(), "Application exiting normally");
        Ok(())
    }

    async fn run_event_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        let mut terminal_events = EventStream::new();

        self.draw(terminal)?;

        while self.state != AppState::Exiting {
            tokio::select! {
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }

                Some(event) = self.image_rx.recv() => {
                    self.handle_image_event(event);
                }

                Some(Ok(event)) = terminal_events.next() => {
                    if self.handle_terminal_event(&event) == EventResult::Exit {
                        self.state = AppState::Exiting;
                        continue;
                    }
                }

                else => break,
            }

            self.draw(terminal)?;
        }

        Ok(())
    }

    /// Draws a frame, then reacts to what it showed. A frame that started a
    /// page fetch is drawn again so the loading footer appears right away.
    fn draw(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        terminal.draw(|frame| self.render(frame))?;
        if self.after_frame() {
            terminal.draw(|frame| self.render(frame))?;
            self.after_frame();
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let banner_height = u16::from(self.gallery.error().is_some());
        let [banner_area, grid_area, footer_area] = Layout::vertical([
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        if let Some(error) = self.gallery.error() {
            let banner = StatusBar::error(error).hint(error_hint(self.gallery.policy()));
            frame.render_widget(&banner, banner_area);
        }

        let photos = self.gallery.items();
        let visible = self.grid.visible_cards(0);
        self.image_manager
            .update_visible_protocols(&mut self.grid.attachments, photos, visible);
        frame.render_stateful_widget(
            GalleryGrid::new(photos).footer(self.marker_text()),
            grid_area,
            &mut self.grid,
        );

        let info = format!(
            "{} photos · page {} ",
            self.gallery.len(),
            self.gallery.cursor()
        );
        frame.render_widget(
            FooterBar::new(self.events.keybinds()).right_info(Some(&info)),
            footer_area,
        );
    }

    fn marker_text(&self) -> Option<&'static str> {
        if self.gallery.is_loading() {
            Some(LOADING_TEXT)
        } else if self.gallery.is_exhausted() {
            Some(EXHAUSTED_TEXT)
        } else {
            None
        }
    }

    /// Returns true when the frame led to a state change worth redrawing.
    fn after_frame(&mut self) -> bool {
        let mut changed = false;
        for id in self.grid.take_rendered() {
            changed |= self.gallery.mark_loaded(&id);
        }
        changed |= self.observe_sentinel();
        self.request_visible_images();
        changed
    }

    fn observe_sentinel(&mut self) -> bool {
        self.sentinel.sync(self.gallery.is_loading());

        let margin = self
            .sentinel
            .config()
            .margin_rows(self.grid.cell().height);
        let ratio = self.grid.marker_ratio(margin);
        if !self.sentinel.observe(ratio, self.gallery.has_more()) {
            return false;
        }

        let Some(request) = self.gallery.on_sentinel() else {
            return false;
        };
        self.request_page(request);
        self.sentinel.sync(self.gallery.is_loading());
        true
    }

    fn request_page(&self, request: PageRequest) {
        debug!(page = request.page, limit = request.limit, "Requesting page");
        if let Err(e) = self.command_tx.send(BackendCommand::FetchPage(request)) {
            warn!(error = %e, "Backend worker is gone");
        }
    }

    fn request_visible_images(&mut self) {
        let photos = self.gallery.items();
        let range = self.grid.visible_cards(self.load_buffer_rows);

        let cancelled =
            ImageManager::clear_distant_protocols(&mut self.grid.attachments, photos, &range);
        for id in &cancelled {
            self.image_loader.cancel(id);
        }

        let needed = ImageManager::collect_needed_loads(&mut self.grid.attachments, photos, range);
        if !needed.is_empty() {
            debug!(count = needed.len(), "Requesting card images");
            self.image_loader.load_batch(needed);
        }
    }

    fn handle_action(&mut self, action: Action) {
        let (page, result) = match action {
            Action::PageLoaded { page, photos } => (page, Ok(photos)),
            Action::PageFailed { page, error } => (page, Err(error)),
        };

        match self.gallery.apply_page(page, result) {
            PageOutcome::Failed(error) => {
                warn!(page, error = %error, "Page failed");
                // A marker still in view must not refetch on its own.
                self.sentinel.wait_for_exit();
            }
            outcome => info!(page, %outcome, "Page applied"),
        }
    }

    fn handle_image_event(&mut self, event: ImageLoadedEvent) {
        let Some(attachment) = self.grid.attachments.get_mut(&event.id) else {
            return;
        };
        match event.result {
            Ok(loaded) => attachment.set_loaded(loaded.image),
            Err(e) => {
                warn!(id = %event.id, error = %e, "Card image unavailable");
                attachment.set_failed(e);
            }
        }
    }

    fn handle_terminal_event(&mut self, event: &Event) -> EventResult {
        let Some(action) = self.events.action_for(event) else {
            return EventResult::Continue;
        };

        if self.gallery.error().is_some()
            && matches!(
                action,
                KeyAction::ScrollDown | KeyAction::PageDown | KeyAction::ScrollToBottom
            )
        {
            self.sentinel.reenter();
        }

        match action {
            KeyAction::Quit => return EventResult::Exit,
            KeyAction::ScrollDown => self.grid.scroll_down(SCROLL_LINES),
            KeyAction::ScrollUp => self.grid.scroll_up(SCROLL_LINES),
            KeyAction::PageDown => self.grid.page_down(),
            KeyAction::PageUp => self.grid.page_up(),
            KeyAction::ScrollToTop => self.grid.scroll_to_top(),
            KeyAction::ScrollToBottom => self.grid.scroll_to_bottom(),
        }
        EventResult::Consumed
    }
}

const fn error_hint(policy: PageErrorPolicy) -> &'static str {
    match policy {
        PageErrorPolicy::Retry => "scroll down to retry",
        PageErrorPolicy::Skip => "scroll down to skip",
        PageErrorPolicy::Halt => "loading stopped",
    }
}
