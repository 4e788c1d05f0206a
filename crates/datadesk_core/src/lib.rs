//! Core library for datadesk.
//!
//! Two workflows live here: business-question reports over a SQLite
//! music-store database, and scripted provisioning of a PostgreSQL crime
//! database from a CSV file.

pub mod db;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod provision;
pub mod query;
pub mod render;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging};
pub use model::crime::{CrimeRecord, Weekday};
pub use model::store::{
    AlbumPurchaseSummary, CountrySales, EmployeeSales, GenreSales, InvoicePurchase, StoreObject,
};
pub use query::adhoc::{run_sql, QueryError, QueryResult};
pub use query::result_set::{CellValue, IntoResultSet, ResultSet};
pub use render::{render, OutputFormat, RenderError};
pub use repo::store_repo::{
    GenreSalesQuery, RepoError, RepoResult, SqliteStoreRepository, StoreRepository,
};
pub use service::report_service::{AlbumReport, ReportService, StoreReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
