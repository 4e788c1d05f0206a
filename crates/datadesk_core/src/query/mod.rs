//! Ad-hoc SQL entry points.
//!
//! # Responsibility
//! - Run arbitrary read statements against the store and keep the result
//!   untyped (`ResultSet`) for rendering.
//! - Provide the shared tabular shape used by typed reports and by the
//!   provisioning verification queries.

pub mod adhoc;
pub mod result_set;
