//! Presentation layer with UI components and event handling.

/// Lazy cover loading and rendering.
pub mod cover;
/// Event handling.
pub mod events;
/// UI screens.
pub mod ui;
/// Reusable widgets.
pub mod widgets;

pub use ui::{App, AppSettings};
