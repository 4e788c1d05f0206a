//! Use-case orchestration over the store repository.
//!
//! # Responsibility
//! - Run the business questions in a fixed order and time each one.
//! - Keep CLI callers decoupled from SQL and row decoding.

pub mod report_service;
