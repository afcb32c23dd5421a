mod book_card;
mod cover_renderer;
mod input;
mod status_bar;

pub use book_card::{BookCard, CARD_HEIGHT, CARD_WIDTH, star_line, truncate};
pub use cover_renderer::CoverRenderer;
pub use input::TextInput;
pub use status_bar::{StatusBar, StatusLevel};
