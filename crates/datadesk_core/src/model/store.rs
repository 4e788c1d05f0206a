//! Music-store report rows.
//!
//! # Invariants
//! - Percentages are expressed in the 0..=100 range, not as fractions.
//! - Monetary sums keep full `f64` precision; rounding is a rendering concern.

use serde::Serialize;

/// Bucket name used for countries that have a single customer.
pub const OTHER_COUNTRY: &str = "Other";

/// Tracks sold for one genre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreSales {
    pub genre: String,
    pub tracks_sold: i64,
    /// Share of all tracks sold in the same query scope.
    pub percentage_sold: f64,
}

/// Sales attributed to one support agent through their customers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeSales {
    pub employee_id: i64,
    pub employee_name: String,
    pub title: Option<String>,
    pub hire_date: Option<String>,
    pub customers: i64,
    pub invoices: i64,
    pub total_sales: f64,
}

/// Per-country statistics, with single-customer countries collapsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySales {
    /// Country name, or [`OTHER_COUNTRY`] for the collapsed bucket.
    pub country: String,
    pub customers: i64,
    pub orders: i64,
    pub total_sales: f64,
    pub avg_sales_per_customer: f64,
    pub avg_order_value: f64,
}

impl CountrySales {
    pub fn is_other(&self) -> bool {
        self.country == OTHER_COUNTRY
    }
}

/// Album-purchase classification of one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoicePurchase {
    pub invoice_id: i64,
    pub album_count: i64,
    pub track_count: i64,
    /// Track count of the album the invoice matched, if any.
    pub album_track_count: Option<i64>,
    pub album_purchase: bool,
}

/// Aggregate of [`InvoicePurchase`] classifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumPurchaseSummary {
    pub album_purchases: i64,
    pub individual_purchases: i64,
    pub total_invoices: i64,
    pub album_percentage: f64,
}

impl AlbumPurchaseSummary {
    pub fn from_invoices(invoices: &[InvoicePurchase]) -> Self {
        let total_invoices = invoices.len() as i64;
        let album_purchases = invoices
            .iter()
            .filter(|invoice| invoice.album_purchase)
            .count() as i64;
        let album_percentage = if total_invoices == 0 {
            0.0
        } else {
            album_purchases as f64 * 100.0 / total_invoices as f64
        };

        Self {
            album_purchases,
            individual_purchases: total_invoices - album_purchases,
            total_invoices,
            album_percentage,
        }
    }
}

/// One row of the store's table/view listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreObject {
    pub name: String,
    /// `table` or `view`.
    pub kind: String,
}
