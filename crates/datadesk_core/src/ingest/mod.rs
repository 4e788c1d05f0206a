//! CSV exploration ahead of a bulk load.
//!
//! # Responsibility
//! - Profile an arbitrary CSV column-by-column to pick SQL column types.
//! - Validate the crime CSV row-by-row before it is copied to the server.

pub mod crime_csv;
pub mod profile;
