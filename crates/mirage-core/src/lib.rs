//! Shared contracts for Mirage feature crates

mod error;
mod excerpt;

pub use error::{ErrorBody, ErrorDetails, HttpError};
pub use excerpt::truncate_utf8;
