//! Music-store business queries.
//!
//! # Responsibility
//! - Genre popularity, employee revenue, country statistics and the
//!   album-purchase heuristic as one SQL statement each.
//!
//! # Invariants
//! - Genre percentages are relative to the quantity sold within the same
//!   country filter.
//! - Countries with exactly one customer are reported as one `Other` row,
//!   sorted after every named country.
//! - An invoice is an album purchase iff it touches exactly one album and
//!   its distinct track count equals that album's track count.

use crate::db::DbError;
use crate::model::store::{
    CountrySales, EmployeeSales, GenreSales, InvoicePurchase, StoreObject, OTHER_COUNTRY,
};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const GENRE_SALES_SQL: &str = "WITH sold AS (
    SELECT il.track_id, il.quantity
    FROM invoice_line il
    JOIN invoice i ON i.invoice_id = il.invoice_id
    JOIN customer c ON c.customer_id = i.customer_id
    WHERE ?1 IS NULL OR c.country = ?1
)
SELECT
    g.name AS genre,
    SUM(s.quantity) AS tracks_sold,
    CAST(SUM(s.quantity) AS REAL) * 100.0 / (SELECT SUM(quantity) FROM sold) AS percentage_sold
FROM sold s
JOIN track t ON t.track_id = s.track_id
JOIN genre g ON g.genre_id = t.genre_id
GROUP BY g.genre_id, g.name
ORDER BY tracks_sold DESC, genre ASC";

const EMPLOYEE_SALES_SQL: &str = "SELECT
    e.employee_id AS employee_id,
    e.first_name || ' ' || e.last_name AS employee_name,
    e.title AS title,
    e.hire_date AS hire_date,
    COUNT(DISTINCT c.customer_id) AS customers,
    COUNT(i.invoice_id) AS invoices,
    CAST(SUM(i.total) AS REAL) AS total_sales
FROM employee e
JOIN customer c ON c.support_rep_id = e.employee_id
JOIN invoice i ON i.customer_id = c.customer_id
GROUP BY e.employee_id
ORDER BY total_sales DESC, e.employee_id ASC;";

const COUNTRY_SALES_SQL: &str = "WITH country_stats AS (
    SELECT
        c.country AS country,
        COUNT(DISTINCT c.customer_id) AS customers,
        COUNT(i.invoice_id) AS orders,
        CAST(COALESCE(SUM(i.total), 0) AS REAL) AS total_sales,
        COUNT(DISTINCT c.customer_id) = 1 AS single_customer
    FROM customer c
    LEFT JOIN invoice i ON i.customer_id = c.customer_id
    GROUP BY c.country
),
bucketed AS (
    SELECT country, customers, orders, total_sales, 0 AS is_other
    FROM country_stats
    WHERE single_customer = 0
    UNION ALL
    SELECT ?1, SUM(customers), SUM(orders), SUM(total_sales), 1
    FROM country_stats
    WHERE single_customer = 1
    GROUP BY single_customer
)
SELECT
    country,
    customers,
    orders,
    total_sales,
    total_sales / customers AS avg_sales_per_customer,
    CASE WHEN orders = 0 THEN 0.0 ELSE total_sales / orders END AS avg_order_value
FROM bucketed
ORDER BY is_other ASC, total_sales DESC, country ASC;";

const ALBUM_PURCHASES_SQL: &str = "WITH invoice_tracks AS (
    SELECT
        il.invoice_id AS invoice_id,
        COUNT(DISTINCT t.album_id) AS album_count,
        COUNT(DISTINCT il.track_id) AS track_count,
        MIN(t.album_id) AS album_id
    FROM invoice_line il
    JOIN track t ON t.track_id = il.track_id
    GROUP BY il.invoice_id
),
album_sizes AS (
    SELECT album_id, COUNT(*) AS album_track_count
    FROM track
    WHERE album_id IS NOT NULL
    GROUP BY album_id
)
SELECT
    it.invoice_id AS invoice_id,
    it.album_count AS album_count,
    it.track_count AS track_count,
    s.album_track_count AS album_track_count,
    CASE
        WHEN it.album_count = 1 AND it.track_count = s.album_track_count THEN 1
        ELSE 0
    END AS album_purchase
FROM invoice_tracks it
LEFT JOIN album_sizes s ON s.album_id = it.album_id
ORDER BY it.invoice_id ASC;";

const STORE_OBJECTS_SQL: &str = "SELECT name, type
FROM sqlite_master
WHERE type IN ('table', 'view')
  AND name NOT LIKE 'sqlite_%'
ORDER BY type ASC, name ASC;";

// Summed shares can land a few ulps above 100.
const PERCENT_CEILING: f64 = 100.0 + 1e-9;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A row decoded to a value the query shape cannot produce.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid store row: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Options for the genre popularity query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreSalesQuery {
    /// Restrict to customers in this country (exact match).
    pub country: Option<String>,
    /// Keep only the top `limit` genres; percentages stay relative to all.
    pub limit: Option<u32>,
}

impl GenreSalesQuery {
    pub fn for_country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            limit: None,
        }
    }
}

/// Business questions answered from the store database.
pub trait StoreRepository {
    fn genre_sales(&self, query: &GenreSalesQuery) -> RepoResult<Vec<GenreSales>>;
    fn employee_sales(&self) -> RepoResult<Vec<EmployeeSales>>;
    fn country_sales(&self) -> RepoResult<Vec<CountrySales>>;
    fn album_purchases(&self) -> RepoResult<Vec<InvoicePurchase>>;
    fn list_store_objects(&self) -> RepoResult<Vec<StoreObject>>;
}

/// SQLite-backed store repository.
pub struct SqliteStoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStoreRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StoreRepository for SqliteStoreRepository<'_> {
    fn genre_sales(&self, query: &GenreSalesQuery) -> RepoResult<Vec<GenreSales>> {
        let mut sql = String::from(GENRE_SALES_SQL);
        let mut bind_values: Vec<Value> = vec![match &query.country {
            Some(country) => Value::Text(country.clone()),
            None => Value::Null,
        }];

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?2");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut genres = Vec::new();
        while let Some(row) = rows.next()? {
            genres.push(parse_genre_row(row)?);
        }
        Ok(genres)
    }

    fn employee_sales(&self) -> RepoResult<Vec<EmployeeSales>> {
        let mut stmt = self.conn.prepare(EMPLOYEE_SALES_SQL)?;
        let mut rows = stmt.query([])?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(EmployeeSales {
                employee_id: row.get("employee_id")?,
                employee_name: row.get("employee_name")?,
                title: row.get("title")?,
                hire_date: row.get("hire_date")?,
                customers: row.get("customers")?,
                invoices: row.get("invoices")?,
                total_sales: row.get("total_sales")?,
            });
        }
        Ok(employees)
    }

    fn country_sales(&self) -> RepoResult<Vec<CountrySales>> {
        let mut stmt = self.conn.prepare(COUNTRY_SALES_SQL)?;
        let mut rows = stmt.query([OTHER_COUNTRY])?;
        let mut countries = Vec::new();
        while let Some(row) = rows.next()? {
            countries.push(parse_country_row(row)?);
        }
        Ok(countries)
    }

    fn album_purchases(&self) -> RepoResult<Vec<InvoicePurchase>> {
        let mut stmt = self.conn.prepare(ALBUM_PURCHASES_SQL)?;
        let mut rows = stmt.query([])?;
        let mut invoices = Vec::new();
        while let Some(row) = rows.next()? {
            invoices.push(parse_invoice_purchase_row(row)?);
        }
        Ok(invoices)
    }

    fn list_store_objects(&self) -> RepoResult<Vec<StoreObject>> {
        let mut stmt = self.conn.prepare(STORE_OBJECTS_SQL)?;
        let mut rows = stmt.query([])?;
        let mut objects = Vec::new();
        while let Some(row) = rows.next()? {
            objects.push(StoreObject {
                name: row.get("name")?,
                kind: row.get("type")?,
            });
        }
        Ok(objects)
    }
}

fn parse_genre_row(row: &Row<'_>) -> RepoResult<GenreSales> {
    let genre: Option<String> = row.get("genre")?;
    let percentage_sold: f64 = row.get("percentage_sold")?;
    if !(0.0..=PERCENT_CEILING).contains(&percentage_sold) {
        return Err(RepoError::InvalidData(format!(
            "genre percentage `{percentage_sold}` is outside 0..=100"
        )));
    }

    Ok(GenreSales {
        genre: genre.unwrap_or_default(),
        tracks_sold: row.get("tracks_sold")?,
        percentage_sold,
    })
}

fn parse_country_row(row: &Row<'_>) -> RepoResult<CountrySales> {
    let country: Option<String> = row.get("country")?;
    let customers: i64 = row.get("customers")?;
    if customers <= 0 {
        return Err(RepoError::InvalidData(format!(
            "country `{}` reported {customers} customers",
            country.as_deref().unwrap_or("")
        )));
    }

    Ok(CountrySales {
        country: country.unwrap_or_default(),
        customers,
        orders: row.get("orders")?,
        total_sales: row.get("total_sales")?,
        avg_sales_per_customer: row.get("avg_sales_per_customer")?,
        avg_order_value: row.get("avg_order_value")?,
    })
}

fn parse_invoice_purchase_row(row: &Row<'_>) -> RepoResult<InvoicePurchase> {
    let album_purchase = match row.get::<_, i64>("album_purchase")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid album_purchase flag `{other}`"
            )));
        }
    };

    Ok(InvoicePurchase {
        invoice_id: row.get("invoice_id")?,
        album_count: row.get("album_count")?,
        track_count: row.get("track_count")?,
        album_track_count: row.get("album_track_count")?,
        album_purchase,
    })
}
