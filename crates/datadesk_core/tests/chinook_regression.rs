//! Regression checks against the published Chinook store.
//!
//! Runs only when `DATADESK_CHINOOK_DB` points at the fixture file.

use datadesk_core::db::open_store_db;
use datadesk_core::{GenreSalesQuery, ReportService, SqliteStoreRepository};
use rusqlite::Connection;

fn chinook() -> Option<Connection> {
    let path = std::env::var_os("DATADESK_CHINOOK_DB")?;
    Some(open_store_db(path).unwrap())
}

#[test]
fn rock_leads_genre_sales() {
    let Some(conn) = chinook() else {
        eprintln!("DATADESK_CHINOOK_DB not set; skipping");
        return;
    };
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    let genres = service.genre_sales(&GenreSalesQuery::default()).unwrap();
    assert_eq!(genres[0].genre, "Rock");
    assert_eq!(genres[0].tracks_sold, 2635);
    assert_eq!(format!("{:.2}", genres[0].percentage_sold), "55.39");
}

#[test]
fn album_purchases_are_a_minority() {
    let Some(conn) = chinook() else {
        eprintln!("DATADESK_CHINOOK_DB not set; skipping");
        return;
    };
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    let summary = service.album_report().unwrap().summary;
    assert_eq!(summary.album_purchases, 114);
    assert_eq!(summary.total_invoices, 614);
    assert_eq!(format!("{:.1}", summary.album_percentage), "18.6");
}
