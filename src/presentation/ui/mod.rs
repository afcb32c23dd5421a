//! UI screens.

mod add_book_form;
mod app;
mod catalog_screen;
mod detail_view;
mod search_panel;
mod utils;

pub use add_book_form::{AddBookForm, BookField, FormAction};
pub use app::{App, AppSettings};
pub use catalog_screen::{
    CatalogKeyResult, CatalogScreen, CatalogScreenState, CatalogTab, PageInfo, card_rect,
    columns_for,
};
pub use detail_view::{DETAIL_RETRY_COUNT, DetailAction, DetailView, DetailViewState};
pub use search_panel::{CatalogMetadata, SearchAction, SearchPanel};
