//! sqtyped
//!
//! Static type checking and declaration extraction for Squirrel source
//! extended with optional type annotations.

pub mod utils;
pub mod types;
pub mod symbols;
pub mod syntax;
pub mod frontend;
pub mod extract;
pub mod checker;

pub use checker::{CheckReport, Checker, CheckerOptions, Diagnostic, Severity};
pub use extract::{extract, extract_source, TypeExtractor};
pub use symbols::ExtractionResult;
