//! Music-store schema registry.
//!
//! # Responsibility
//! - Ship the DDL for an empty, query-compatible store database.
//! - Check pre-built store files before any business query runs.
//!
//! # Invariants
//! - `STORE_TABLES` lists exactly the tables created by `store_schema.sql`.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

const STORE_SCHEMA_SQL: &str = include_str!("store_schema.sql");

/// Tables every store database must provide.
pub const STORE_TABLES: &[&str] = &[
    "media_type",
    "genre",
    "artist",
    "album",
    "track",
    "employee",
    "customer",
    "invoice",
    "invoice_line",
    "playlist",
    "playlist_track",
];

/// Creates all store tables that do not exist yet.
pub fn apply_store_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(STORE_SCHEMA_SQL)?;
    Ok(())
}

/// Fails with the first store table that is absent from `conn`.
pub fn verify_store_schema(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?1
        );",
    )?;

    for table in STORE_TABLES {
        let exists: bool = stmt.query_row([table], |row| row.get(0))?;
        if !exists {
            return Err(DbError::MissingTable(*table));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_store_schema, verify_store_schema, STORE_TABLES};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn schema_script_creates_every_registered_table() {
        let conn = Connection::open_in_memory().unwrap();
        apply_store_schema(&conn).unwrap();
        verify_store_schema(&conn).unwrap();

        let created: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(created as usize, STORE_TABLES.len());
    }

    #[test]
    fn schema_script_is_rerunnable() {
        let conn = Connection::open_in_memory().unwrap();
        apply_store_schema(&conn).unwrap();
        apply_store_schema(&conn).unwrap();
    }

    #[test]
    fn verify_reports_first_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE media_type (media_type_id INTEGER PRIMARY KEY);")
            .unwrap();

        match verify_store_schema(&conn).unwrap_err() {
            DbError::MissingTable(table) => assert_eq!(table, "genre"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
