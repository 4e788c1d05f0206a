//! Store query contracts and their SQLite implementation.
//!
//! # Responsibility
//! - Keep the business-question SQL inside one persistence boundary.
//! - Decode rows into the typed models in `crate::model::store`.
//!
//! # Invariants
//! - Every query is read-only and runs as a single statement.
//! - Row decoding rejects shapes the schema cannot produce instead of
//!   masking them.

pub mod store_repo;
