//! Checks `PostgresExecutor` against a live server.
//!
//! Runs only when `DATADESK_PG_HOST` is set; `PGPORT`, `PGUSER` and
//! `PGPASSWORD` are honoured when present.

use datadesk_core::provision::{ConnectionConfig, PostgresExecutor, SqlExecutor, Target};
use datadesk_core::CellValue;

fn executor() -> Option<PostgresExecutor> {
    let host = std::env::var("DATADESK_PG_HOST").ok()?;
    let mut connection = ConnectionConfig {
        host,
        ..ConnectionConfig::default()
    };
    if let Ok(port) = std::env::var("PGPORT") {
        connection.port = port.parse().unwrap();
    }
    if let Ok(user) = std::env::var("PGUSER") {
        connection.user = user;
    }
    connection.password = std::env::var("PGPASSWORD").ok();
    Some(PostgresExecutor::new(connection, "unused"))
}

#[test]
fn empty_query_keeps_column_names() {
    let Some(mut executor) = executor() else {
        eprintln!("DATADESK_PG_HOST not set; skipping");
        return;
    };

    let result = executor
        .query(Target::Maintenance, "SELECT 1 AS a, 'x' AS b WHERE false;")
        .unwrap();

    assert_eq!(result.columns, vec!["a", "b"]);
    assert!(result.is_empty());
}

#[test]
fn query_returns_text_cells() {
    let Some(mut executor) = executor() else {
        eprintln!("DATADESK_PG_HOST not set; skipping");
        return;
    };

    let result = executor
        .query(Target::Maintenance, "SELECT 42 AS answer, NULL AS missing;")
        .unwrap();

    assert_eq!(result.columns, vec!["answer", "missing"]);
    assert_eq!(result.cell(0, "answer"), Some(&CellValue::from("42")));
    assert_eq!(result.cell(0, "missing"), Some(&CellValue::Null));
}
