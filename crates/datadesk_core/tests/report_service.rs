mod common;

use common::{assert_close, seed_store};
use datadesk_core::db::open_store_db_in_memory;
use datadesk_core::db::schema::STORE_TABLES;
use datadesk_core::{
    render, GenreSalesQuery, IntoResultSet, OutputFormat, ReportService, SqliteStoreRepository,
};

#[test]
fn full_report_collects_every_section() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    let report = service.full_report().unwrap();
    assert_eq!(report.genres.len(), 3);
    assert_eq!(report.employees.len(), 2);
    assert_eq!(report.countries.len(), 3);
    assert_eq!(report.albums.invoices.len(), 7);
    assert_eq!(report.albums.summary.album_purchases, 3);
    assert_eq!(report.albums.summary.individual_purchases, 4);
    assert_close(report.albums.summary.album_percentage, 300.0 / 7.0);
}

#[test]
fn album_report_summary_matches_invoices() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    let albums = service.album_report().unwrap();
    let yes = albums
        .invoices
        .iter()
        .filter(|invoice| invoice.album_purchase)
        .count() as i64;
    assert_eq!(albums.summary.album_purchases, yes);
    assert_eq!(albums.summary.total_invoices, 7);
}

#[test]
fn report_sections_render_as_tables() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    let countries = service.country_sales().unwrap();
    let mut out = Vec::new();
    render(&countries.into_result_set(), OutputFormat::Table, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let lines = text.lines().collect::<Vec<_>>();
    assert!(lines[0].starts_with("country"));
    assert!(lines[2].starts_with("USA"));
    assert!(lines[2].contains("6.93"));
    assert!(lines[4].starts_with("Other"));
    assert_eq!(lines[5], "(3 rows)");
}

#[test]
fn genre_section_renders_as_json() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    let genres = service
        .genre_sales(&GenreSalesQuery::for_country("Canada"))
        .unwrap();
    let mut out = Vec::new();
    render(&genres.into_result_set(), OutputFormat::Json, &mut out).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["genre"], "Jazz");
    assert_eq!(parsed[0]["tracks_sold"], 3);
}

#[test]
fn store_objects_list_every_table() {
    let conn = open_store_db_in_memory().unwrap();
    let service = ReportService::new(SqliteStoreRepository::new(&conn));

    let objects = service.list_store_objects().unwrap();
    let names = objects
        .iter()
        .map(|object| object.name.as_str())
        .collect::<Vec<_>>();

    assert_eq!(objects.len(), STORE_TABLES.len());
    assert!(objects.iter().all(|object| object.kind == "table"));
    assert!(names.contains(&"invoice_line"));
}
