//! Connection bootstrap for store databases.
//!
//! # Invariants
//! - Returned connections passed `verify_store_schema`.
//! - `open_store_db` connections are read-only.

use super::schema::{apply_store_schema, verify_store_schema};
use super::DbResult;
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens an existing store database file read-only.
///
/// # Errors
/// - `DbError::Sqlite` when the file is missing or not a SQLite database.
/// - `DbError::MissingTable` when the file lacks a store table.
pub fn open_store_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=readonly path={}",
        path.display()
    );

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let result: DbResult<Connection> = Connection::open_with_flags(path, flags)
        .map_err(Into::into)
        .and_then(|conn| {
            configure(&conn)?;
            verify_store_schema(&conn)?;
            Ok(conn)
        });
    log_open_result("readonly", started_at, &result);
    result
}

/// Creates (or reuses) a writable store file and applies the store DDL.
///
/// Tables that already exist are left untouched.
pub fn create_store_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=create");

    let result: DbResult<Connection> = Connection::open(path)
        .map_err(Into::into)
        .and_then(|conn| {
            configure(&conn)?;
            apply_store_schema(&conn)?;
            verify_store_schema(&conn)?;
            Ok(conn)
        });
    log_open_result("create", started_at, &result);
    result
}

/// Opens an empty in-memory store with the full schema applied.
pub fn open_store_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let result: DbResult<Connection> = Connection::open_in_memory()
        .map_err(Into::into)
        .and_then(|conn| {
            configure(&conn)?;
            apply_store_schema(&conn)?;
            Ok(conn)
        });
    log_open_result("memory", started_at, &result);
    result
}

fn configure(conn: &Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(())
}

fn log_open_result(mode: &str, started_at: Instant, result: &DbResult<Connection>) {
    match result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
