//! Domain error types.

mod api_error;
mod cover_error;

pub use api_error::ApiError;
pub use cover_error::{CoverError, CoverResult};
