//! SQLite bootstrap for the music-store database.
//!
//! # Responsibility
//! - Open store databases (file or in-memory) with consistent pragmas.
//! - Check that a pre-built store carries every table the queries read.
//!
//! # Invariants
//! - Existing store files are opened read-only and never migrated.
//! - Callers never query a store whose schema check failed.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{create_store_db, open_store_db, open_store_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A table required by the store queries is absent.
    MissingTable(&'static str),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingTable(table) => {
                write!(f, "store database is missing required table `{table}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
