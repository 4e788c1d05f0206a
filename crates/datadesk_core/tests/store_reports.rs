mod common;

use common::{assert_close, seed_store};
use datadesk_core::db::open_store_db_in_memory;
use datadesk_core::{GenreSalesQuery, SqliteStoreRepository, StoreRepository};

#[test]
fn genre_sales_ranks_genres_by_quantity() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let genres = repo.genre_sales(&GenreSalesQuery::default()).unwrap();
    let names = genres.iter().map(|row| row.genre.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Rock", "Jazz", "Metal"]);
    assert_eq!(genres[0].tracks_sold, 7);
    assert_eq!(genres[1].tracks_sold, 5);
    assert_eq!(genres[2].tracks_sold, 1);
    assert_close(genres[0].percentage_sold, 700.0 / 13.0);
}

#[test]
fn genre_percentages_sum_to_one_hundred() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let genres = repo.genre_sales(&GenreSalesQuery::default()).unwrap();
    let total: f64 = genres.iter().map(|row| row.percentage_sold).sum();
    assert_close(total, 100.0);
}

#[test]
fn genre_sales_can_filter_by_country() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let genres = repo
        .genre_sales(&GenreSalesQuery::for_country("USA"))
        .unwrap();
    assert_eq!(genres.len(), 2);
    assert_eq!(genres[0].genre, "Rock");
    assert_eq!(genres[0].tracks_sold, 5);
    assert_close(genres[0].percentage_sold, 500.0 / 7.0);
    assert_eq!(genres[1].genre, "Jazz");
    assert_eq!(genres[1].tracks_sold, 2);
}

#[test]
fn genre_limit_keeps_shares_relative_to_all_genres() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let query = GenreSalesQuery {
        country: None,
        limit: Some(1),
    };
    let genres = repo.genre_sales(&query).unwrap();
    assert_eq!(genres.len(), 1);
    assert_close(genres[0].percentage_sold, 700.0 / 13.0);
}

#[test]
fn genre_sales_for_unknown_country_is_empty() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let genres = repo
        .genre_sales(&GenreSalesQuery::for_country("Atlantis"))
        .unwrap();
    assert!(genres.is_empty());
}

#[test]
fn employee_sales_sum_invoices_through_customers() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let employees = repo.employee_sales().unwrap();
    assert_eq!(employees.len(), 2, "employees without customers are omitted");

    assert_eq!(employees[0].employee_name, "Jane Peacock");
    assert_eq!(employees[0].customers, 3);
    assert_eq!(employees[0].invoices, 4);
    assert_close(employees[0].total_sales, 7.92);
    assert_eq!(
        employees[0].hire_date.as_deref(),
        Some("2017-04-01 00:00:00")
    );

    assert_eq!(employees[1].employee_name, "Margaret Park");
    assert_eq!(employees[1].invoices, 3);
    assert_close(employees[1].total_sales, 4.95);
}

#[test]
fn single_customer_countries_collapse_into_other() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let countries = repo.country_sales().unwrap();
    let names = countries
        .iter()
        .map(|row| row.country.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["USA", "Canada", "Other"]);

    let usa = &countries[0];
    assert_eq!(usa.customers, 2);
    assert_eq!(usa.orders, 3);
    assert_close(usa.total_sales, 6.93);
    assert_close(usa.avg_sales_per_customer, 3.465);
    assert_close(usa.avg_order_value, 2.31);

    let other = &countries[2];
    assert!(other.is_other());
    assert_eq!(other.customers, 2);
    assert_eq!(other.orders, 2);
    assert_close(other.total_sales, 1.98);
}

#[test]
fn other_row_is_omitted_when_every_country_has_several_customers() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    conn.execute_batch(
        "INSERT INTO customer (customer_id, first_name, last_name, country, email, support_rep_id) VALUES
            (7, 'Gil', 'Gomes', 'Brazil', 'gil@example.com', 1),
            (8, 'Hari', 'Hyderabad', 'India', 'hari@example.com', 2);",
    )
    .unwrap();
    let repo = SqliteStoreRepository::new(&conn);

    let countries = repo.country_sales().unwrap();
    assert!(countries.iter().all(|row| !row.is_other()));
    assert_eq!(countries.len(), 4);

    let brazil = countries.iter().find(|row| row.country == "Brazil").unwrap();
    assert_eq!(brazil.customers, 2);
    assert_eq!(brazil.orders, 1);
    assert_close(brazil.avg_sales_per_customer, 0.495);
}

#[test]
fn other_row_sorts_last_even_with_the_largest_total() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    conn.execute_batch(
        "INSERT INTO invoice (invoice_id, customer_id, invoice_date, total) VALUES
            (8, 5, '2017-02-01 00:00:00', 99.0);",
    )
    .unwrap();
    let repo = SqliteStoreRepository::new(&conn);

    let countries = repo.country_sales().unwrap();
    assert!(countries.last().unwrap().is_other());
    assert_close(countries.last().unwrap().total_sales, 100.98);
}

#[test]
fn customer_without_invoices_counts_without_orders() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    conn.execute_batch(
        "INSERT INTO customer (customer_id, first_name, last_name, country, email, support_rep_id) VALUES
            (7, 'Ines', 'Iquique', 'Chile', 'ines@example.com', 1);",
    )
    .unwrap();
    let repo = SqliteStoreRepository::new(&conn);

    let other = repo
        .country_sales()
        .unwrap()
        .into_iter()
        .find(|row| row.is_other())
        .unwrap();
    assert_eq!(other.customers, 3);
    assert_eq!(other.orders, 2);
    assert_close(other.avg_sales_per_customer, 0.66);
}

#[test]
fn album_purchase_heuristic_classifies_each_invoice() {
    let conn = open_store_db_in_memory().unwrap();
    seed_store(&conn);
    let repo = SqliteStoreRepository::new(&conn);

    let invoices = repo.album_purchases().unwrap();
    let flags = invoices
        .iter()
        .map(|row| (row.invoice_id, row.album_purchase))
        .collect::<Vec<_>>();
    assert_eq!(
        flags,
        vec![
            (1, true),
            (2, false),
            (3, true),
            (4, false),
            (5, true),
            (6, false),
            (7, false),
        ]
    );

    let two_albums = &invoices[3];
    assert_eq!(two_albums.album_count, 2);
    assert_eq!(two_albums.track_count, 2);

    let repeated_track = &invoices[6];
    assert_eq!(repeated_track.track_count, 1);
    assert_eq!(repeated_track.album_track_count, Some(2));
}

#[test]
fn empty_store_yields_empty_reports() {
    let conn = open_store_db_in_memory().unwrap();
    let repo = SqliteStoreRepository::new(&conn);

    assert!(repo.genre_sales(&GenreSalesQuery::default()).unwrap().is_empty());
    assert!(repo.employee_sales().unwrap().is_empty());
    assert!(repo.country_sales().unwrap().is_empty());
    assert!(repo.album_purchases().unwrap().is_empty());
}

#[test]
fn store_objects_list_tables() {
    let conn = open_store_db_in_memory().unwrap();
    conn.execute_batch("CREATE VIEW rock_tracks AS SELECT * FROM track WHERE genre_id = 1;")
        .unwrap();
    let repo = SqliteStoreRepository::new(&conn);

    let objects = repo.list_store_objects().unwrap();
    assert!(objects
        .iter()
        .any(|object| object.name == "invoice_line" && object.kind == "table"));
    assert_eq!(objects.last().unwrap().name, "rock_tracks");
    assert_eq!(objects.last().unwrap().kind, "view");
}
