//! Event handling.

use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

use crate::domain::keybinding::{Action, Keybind, default_keybinds, resolve};

/// Result of event handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    /// Continue processing.
    Continue,
    /// Exit application.
    Exit,
    /// Event was consumed.
    Consumed,
}

/// Translates terminal events into gallery actions.
pub struct EventHandler {
    keybinds: Vec<Keybind>,
    mouse: bool,
}

impl EventHandler {
    /// Creates new handler with the default bindings.
    #[must_use]
    pub fn new(mouse: bool) -> Self {
        Self::with_keybinds(default_keybinds(), mouse)
    }

    /// Creates handler with a custom binding table.
    #[must_use]
    pub const fn with_keybinds(keybinds: Vec<Keybind>, mouse: bool) -> Self {
        Self { keybinds, mouse }
    }

    #[must_use]
    pub fn keybinds(&self) -> &[Keybind] {
        &self.keybinds
    }

    #[must_use]
    pub const fn mouse_enabled(&self) -> bool {
        self.mouse
    }

    /// Maps a terminal event to an action, if it is bound.
    #[must_use]
    pub fn action_for(&self, event: &Event) -> Option<Action> {
        match event {
            Event::Key(key) => self.key_action(key),
            Event::Mouse(mouse) if self.mouse => Self::mouse_action(mouse),
            _ => None,
        }
    }

    fn key_action(&self, key: &KeyEvent) -> Option<Action> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        resolve(&self.keybinds, key)
    }

    const fn mouse_action(mouse: &MouseEvent) -> Option<Action> {
        match mouse.kind {
            MouseEventKind::ScrollDown => Some(Action::ScrollDown),
            MouseEventKind::ScrollUp => Some(Action::ScrollUp),
            _ => None,
        }
    }

    /// Checks if key is a quit event.
    #[must_use]
    pub fn is_quit_event(&self, key: &KeyEvent) -> bool {
        self.key_action(key) == Some(Action::Quit)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn make_key_event(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new_with_kind(code, modifiers, KeyEventKind::Press)
    }

    fn wheel(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_quit_events() {
        let handler = EventHandler::default();
        assert!(handler.is_quit_event(&make_key_event(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(handler.is_quit_event(&make_key_event(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(handler.is_quit_event(&make_key_event(KeyCode::Esc, KeyModifiers::NONE)));
    }

    #[test]
    fn test_non_quit_events() {
        let handler = EventHandler::default();
        assert!(!handler.is_quit_event(&make_key_event(KeyCode::Char('a'), KeyModifiers::NONE)));
        assert!(!handler.is_quit_event(&make_key_event(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let handler = EventHandler::default();
        let release =
            KeyEvent::new_with_kind(KeyCode::Char('j'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(handler.action_for(&Event::Key(release)), None);
    }

    #[test]
    fn test_scroll_keys() {
        let handler = EventHandler::default();
        let down = Event::Key(make_key_event(KeyCode::Down, KeyModifiers::NONE));
        let page = Event::Key(make_key_event(KeyCode::Char(' '), KeyModifiers::NONE));
        assert_eq!(handler.action_for(&down), Some(Action::ScrollDown));
        assert_eq!(handler.action_for(&page), Some(Action::PageDown));
    }

    #[test]
    fn test_mouse_wheel() {
        let handler = EventHandler::new(true);
        assert_eq!(
            handler.action_for(&wheel(MouseEventKind::ScrollDown)),
            Some(Action::ScrollDown)
        );
        assert_eq!(
            handler.action_for(&wheel(MouseEventKind::ScrollUp)),
            Some(Action::ScrollUp)
        );
    }

    #[test]
    fn test_mouse_disabled() {
        let handler = EventHandler::new(false);
        assert_eq!(handler.action_for(&wheel(MouseEventKind::ScrollDown)), None);
    }
}
