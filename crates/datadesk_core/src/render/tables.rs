//! Column layouts for typed report rows.

use crate::model::store::{
    AlbumPurchaseSummary, CountrySales, EmployeeSales, GenreSales, InvoicePurchase, StoreObject,
};
use crate::query::result_set::{IntoResultSet, ResultSet};

impl IntoResultSet for &[GenreSales] {
    fn into_result_set(self) -> ResultSet {
        let mut set = ResultSet::with_columns(&["genre", "tracks_sold", "percentage_sold"]);
        for row in self {
            set.push_row(vec![
                row.genre.as_str().into(),
                row.tracks_sold.into(),
                row.percentage_sold.into(),
            ]);
        }
        set
    }
}

impl IntoResultSet for &[EmployeeSales] {
    fn into_result_set(self) -> ResultSet {
        let mut set = ResultSet::with_columns(&[
            "employee_id",
            "employee_name",
            "title",
            "hire_date",
            "customers",
            "invoices",
            "total_sales",
        ]);
        for row in self {
            set.push_row(vec![
                row.employee_id.into(),
                row.employee_name.as_str().into(),
                row.title.as_deref().into(),
                row.hire_date.as_deref().into(),
                row.customers.into(),
                row.invoices.into(),
                row.total_sales.into(),
            ]);
        }
        set
    }
}

impl IntoResultSet for &[CountrySales] {
    fn into_result_set(self) -> ResultSet {
        let mut set = ResultSet::with_columns(&[
            "country",
            "customers",
            "orders",
            "total_sales",
            "avg_sales_per_customer",
            "avg_order_value",
        ]);
        for row in self {
            set.push_row(vec![
                row.country.as_str().into(),
                row.customers.into(),
                row.orders.into(),
                row.total_sales.into(),
                row.avg_sales_per_customer.into(),
                row.avg_order_value.into(),
            ]);
        }
        set
    }
}

impl IntoResultSet for &[InvoicePurchase] {
    fn into_result_set(self) -> ResultSet {
        let mut set = ResultSet::with_columns(&[
            "invoice_id",
            "album_count",
            "track_count",
            "album_track_count",
            "album_purchase",
        ]);
        for row in self {
            set.push_row(vec![
                row.invoice_id.into(),
                row.album_count.into(),
                row.track_count.into(),
                row.album_track_count.into(),
                row.album_purchase.into(),
            ]);
        }
        set
    }
}

impl IntoResultSet for &AlbumPurchaseSummary {
    fn into_result_set(self) -> ResultSet {
        let mut set = ResultSet::with_columns(&["album_purchase", "invoices", "percentage"]);
        let share = |count: i64| {
            if self.total_invoices == 0 {
                0.0
            } else {
                count as f64 * 100.0 / self.total_invoices as f64
            }
        };
        set.push_row(vec![
            true.into(),
            self.album_purchases.into(),
            share(self.album_purchases).into(),
        ]);
        set.push_row(vec![
            false.into(),
            self.individual_purchases.into(),
            share(self.individual_purchases).into(),
        ]);
        set
    }
}

impl IntoResultSet for &[StoreObject] {
    fn into_result_set(self) -> ResultSet {
        let mut set = ResultSet::with_columns(&["name", "type"]);
        for row in self {
            set.push_row(vec![row.name.as_str().into(), row.kind.as_str().into()]);
        }
        set
    }
}
