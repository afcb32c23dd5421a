//! Lazily loaded, retrying book covers.

pub mod loader;
pub mod slot;
pub mod view;
pub mod visibility;

pub use loader::{CoverEvent, CoverEventKind, CoverKey, CoverLoader, CoverTransition, backoff_delay};
pub use slot::{CARD_COVER_WIDTH, CoverSlot};
pub use view::{CoverSurface, CoverView};
pub use visibility::{Visibility, VisibilityGate};
