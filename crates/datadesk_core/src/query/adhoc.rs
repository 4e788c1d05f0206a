//! Ad-hoc query runner over the store connection.
//!
//! # Invariants
//! - Only the first statement of `sql` is executed.
//! - SQL preparation failures carry the offending statement text.

use super::result_set::{CellValue, ResultSet};
use crate::db::DbError;
use crate::logging::single_line;
use log::{debug, info};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const MAX_LOGGED_SQL_CHARS: usize = 120;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug)]
pub enum QueryError {
    /// The statement is empty or SQLite refused to prepare it.
    InvalidSql { sql: String, message: String },
    Db(DbError),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSql { sql, message } => write!(f, "invalid SQL `{sql}`: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSql { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for QueryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Runs one SQL statement and collects every returned row.
///
/// Statements that return no columns (e.g. `PRAGMA` writes) yield an empty
/// result set.
pub fn run_sql(conn: &Connection, sql: &str) -> QueryResult<ResultSet> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(QueryError::InvalidSql {
            sql: sql.to_string(),
            message: "statement is empty".to_string(),
        });
    }

    let started_at = Instant::now();
    debug!(
        "event=query_run module=query status=start sql={}",
        single_line(trimmed, MAX_LOGGED_SQL_CHARS)
    );

    let mut stmt = conn.prepare(trimmed).map_err(|err| map_prepare_error(err, trimmed))?;
    let columns = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let column_count = columns.len();
    let mut result = ResultSet::new(columns);

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for index in 0..column_count {
            cells.push(cell_from_ref(row.get_ref(index)?));
        }
        result.push_row(cells);
    }

    info!(
        "event=query_run module=query status=ok rows={} duration_ms={}",
        result.len(),
        started_at.elapsed().as_millis()
    );
    Ok(result)
}

fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(value) => CellValue::Integer(value),
        ValueRef::Real(value) => CellValue::Real(value),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Blob(bytes.to_vec()),
    }
}

fn map_prepare_error(err: rusqlite::Error, sql: &str) -> QueryError {
    match err {
        rusqlite::Error::SqlInputError { msg, .. } => QueryError::InvalidSql {
            sql: sql.to_string(),
            message: msg,
        },
        rusqlite::Error::SqliteFailure(_, Some(message)) => QueryError::InvalidSql {
            sql: sql.to_string(),
            message,
        },
        other => QueryError::Db(DbError::Sqlite(other)),
    }
}
