//! Key classification shared by the screens.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Stateless helpers for interpreting terminal key events.
pub struct EventHandler;

impl EventHandler {
    /// Keys that leave the catalog when no popup is open.
    #[must_use]
    pub fn is_quit_event(key: &KeyEvent) -> bool {
        Self::is_force_quit(key)
            || matches!(
                key,
                KeyEvent {
                    code: KeyCode::Char('q') | KeyCode::Esc,
                    modifiers: KeyModifiers::NONE,
                    ..
                }
            )
    }

    /// Ctrl+C quits from anywhere, popups included.
    #[must_use]
    pub fn is_force_quit(key: &KeyEvent) -> bool {
        matches!(
            key,
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        )
    }

    /// Release and repeat events are reported by some terminals; only
    /// presses drive the UI.
    #[must_use]
    pub fn is_press(key: &KeyEvent) -> bool {
        key.kind == KeyEventKind::Press
    }
}
