//! Output rendering for query results.
//!
//! # Responsibility
//! - Turn a `ResultSet` into aligned text, CSV or JSON.
//! - Map typed report rows onto `ResultSet` columns.

mod format;
mod tables;

pub use format::{render, OutputFormat, RenderError};
