use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,

    // Gallery scrolling
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    ScrollToTop,
    ScrollToBottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybind {
    pub key: KeyEvent,
    pub action: Action,
    pub label: Cow<'static, str>,
    pub visible_in_bar: bool,
}

impl Keybind {
    pub fn new(key: KeyEvent, action: Action, label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key,
            action,
            label: label.into(),
            visible_in_bar: true,
        }
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible_in_bar = false;
        self
    }

    /// Returns true if the pressed key triggers this binding.
    #[must_use]
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.key.code == key.code && self.key.modifiers == key.modifiers
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Default gallery keybindings, in footer display order.
#[must_use]
pub fn default_keybinds() -> Vec<Keybind> {
    vec![
        Keybind::new(key(KeyCode::Char('j')), Action::ScrollDown, "Down"),
        Keybind::new(key(KeyCode::Down), Action::ScrollDown, "Down").hidden(),
        Keybind::new(key(KeyCode::Char('k')), Action::ScrollUp, "Up"),
        Keybind::new(key(KeyCode::Up), Action::ScrollUp, "Up").hidden(),
        Keybind::new(key(KeyCode::PageDown), Action::PageDown, "Page"),
        Keybind::new(key(KeyCode::Char(' ')), Action::PageDown, "Page").hidden(),
        Keybind::new(key(KeyCode::PageUp), Action::PageUp, "Page up").hidden(),
        Keybind::new(key(KeyCode::Char('g')), Action::ScrollToTop, "Top"),
        Keybind::new(key(KeyCode::Home), Action::ScrollToTop, "Top").hidden(),
        Keybind::new(
            KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT),
            Action::ScrollToBottom,
            "Bottom",
        ),
        Keybind::new(key(KeyCode::End), Action::ScrollToBottom, "Bottom").hidden(),
        Keybind::new(key(KeyCode::Char('q')), Action::Quit, "Quit"),
        Keybind::new(key(KeyCode::Esc), Action::Quit, "Quit").hidden(),
        Keybind::new(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Action::Quit,
            "Quit",
        )
        .hidden(),
    ]
}

/// Resolves a key press against a binding table.
#[must_use]
pub fn resolve(keybinds: &[Keybind], pressed: &KeyEvent) -> Option<Action> {
    keybinds
        .iter()
        .find(|bind| bind.matches(pressed))
        .map(|bind| bind.action)
}
