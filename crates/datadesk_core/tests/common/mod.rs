#![allow(dead_code)]

use rusqlite::Connection;

/// Seeds a small store:
///
/// - albums: 1 "Rock Anthems" (tracks 1-3, Rock), 2 "Late Jazz" (tracks 4-5,
///   Jazz), 3 "Lone Single" (track 6, Metal)
/// - employees 1 and 2 support three customers each; employee 3 none
/// - customers 1-2 USA, 3-4 Canada, 5 Brazil, 6 India
/// - invoices 1 (whole album 1), 3 (whole album 2) and 5 (single-track
///   album 3) are album purchases; 2, 4, 6 and 7 are not
pub fn seed_store(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO media_type (media_type_id, name) VALUES (1, 'MPEG audio file');
         INSERT INTO genre (genre_id, name) VALUES (1, 'Rock'), (2, 'Jazz'), (3, 'Metal');
         INSERT INTO artist (artist_id, name) VALUES (1, 'The Fixtures');
         INSERT INTO album (album_id, title, artist_id) VALUES
            (1, 'Rock Anthems', 1), (2, 'Late Jazz', 1), (3, 'Lone Single', 1);
         INSERT INTO track (track_id, name, album_id, media_type_id, genre_id, milliseconds, unit_price) VALUES
            (1, 'Rock One', 1, 1, 1, 200000, 0.99),
            (2, 'Rock Two', 1, 1, 1, 200000, 0.99),
            (3, 'Rock Three', 1, 1, 1, 200000, 0.99),
            (4, 'Jazz One', 2, 1, 2, 300000, 0.99),
            (5, 'Jazz Two', 2, 1, 2, 300000, 0.99),
            (6, 'Only Metal', 3, 1, 3, 250000, 0.99);
         INSERT INTO employee (employee_id, last_name, first_name, title, hire_date) VALUES
            (1, 'Peacock', 'Jane', 'Sales Support Agent', '2017-04-01 00:00:00'),
            (2, 'Park', 'Margaret', 'Sales Support Agent', '2017-05-03 00:00:00'),
            (3, 'Johnson', 'Steve', 'Sales Support Agent', '2017-10-17 00:00:00');
         INSERT INTO customer (customer_id, first_name, last_name, country, email, support_rep_id) VALUES
            (1, 'Ann', 'Arbor', 'USA', 'ann@example.com', 1),
            (2, 'Bob', 'Boston', 'USA', 'bob@example.com', 2),
            (3, 'Cat', 'Calgary', 'Canada', 'cat@example.com', 1),
            (4, 'Dan', 'Dorval', 'Canada', 'dan@example.com', 2),
            (5, 'Eva', 'Recife', 'Brazil', 'eva@example.com', 1),
            (6, 'Fay', 'Delhi', 'India', 'fay@example.com', 2);
         INSERT INTO invoice (invoice_id, customer_id, invoice_date, total) VALUES
            (1, 1, '2017-01-03 00:00:00', 2.97),
            (2, 2, '2017-01-04 00:00:00', 1.98),
            (3, 3, '2017-01-05 00:00:00', 1.98),
            (4, 4, '2017-01-06 00:00:00', 1.98),
            (5, 5, '2017-01-07 00:00:00', 0.99),
            (6, 6, '2017-01-08 00:00:00', 0.99),
            (7, 1, '2017-01-09 00:00:00', 1.98);
         INSERT INTO invoice_line (invoice_line_id, invoice_id, track_id, unit_price, quantity) VALUES
            (1, 1, 1, 0.99, 1),
            (2, 1, 2, 0.99, 1),
            (3, 1, 3, 0.99, 1),
            (4, 2, 1, 0.99, 1),
            (5, 2, 2, 0.99, 1),
            (6, 3, 4, 0.99, 1),
            (7, 3, 5, 0.99, 1),
            (8, 4, 3, 0.99, 1),
            (9, 4, 4, 0.99, 1),
            (10, 5, 6, 0.99, 1),
            (11, 6, 1, 0.99, 1),
            (12, 7, 4, 0.99, 2);",
    )
    .unwrap();
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
