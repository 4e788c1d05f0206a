//! Typed rows produced by both workflows.
//!
//! # Responsibility
//! - Give every business query a named row shape instead of loose tuples.
//! - Describe the crime CSV record and its weekday enumeration.

pub mod crime;
pub mod store;
