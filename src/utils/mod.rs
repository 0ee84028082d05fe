//! Utility module

mod span;
mod error;

pub use span::{Position, Span};
pub use error::{Error, Result};
