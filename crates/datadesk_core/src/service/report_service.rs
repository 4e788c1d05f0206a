//! Store report use-cases.
//!
//! # Invariants
//! - `full_report` runs sections in the order genres, employees, countries,
//!   albums, and stops at the first failing section.

use crate::model::store::{
    AlbumPurchaseSummary, CountrySales, EmployeeSales, GenreSales, InvoicePurchase, StoreObject,
};
use crate::repo::store_repo::{GenreSalesQuery, RepoResult, StoreRepository};
use log::{error, info};
use serde::Serialize;
use std::time::Instant;

/// All business-question answers for one store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreReport {
    pub genres: Vec<GenreSales>,
    pub employees: Vec<EmployeeSales>,
    pub countries: Vec<CountrySales>,
    pub albums: AlbumReport,
}

/// Album-purchase heuristic output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumReport {
    pub summary: AlbumPurchaseSummary,
    pub invoices: Vec<InvoicePurchase>,
}

/// Report facade over a store repository.
pub struct ReportService<R: StoreRepository> {
    repo: R,
}

impl<R: StoreRepository> ReportService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn genre_sales(&self, query: &GenreSalesQuery) -> RepoResult<Vec<GenreSales>> {
        timed("genre_sales", || self.repo.genre_sales(query))
    }

    pub fn employee_sales(&self) -> RepoResult<Vec<EmployeeSales>> {
        timed("employee_sales", || self.repo.employee_sales())
    }

    pub fn country_sales(&self) -> RepoResult<Vec<CountrySales>> {
        timed("country_sales", || self.repo.country_sales())
    }

    /// Classifies every invoice and summarizes the album-purchase share.
    pub fn album_report(&self) -> RepoResult<AlbumReport> {
        let invoices = timed("album_purchases", || self.repo.album_purchases())?;
        let summary = AlbumPurchaseSummary::from_invoices(&invoices);
        Ok(AlbumReport { summary, invoices })
    }

    /// Tables and views present in the store.
    pub fn list_store_objects(&self) -> RepoResult<Vec<StoreObject>> {
        timed("store_objects", || self.repo.list_store_objects())
    }

    /// Runs every section with default genre options.
    pub fn full_report(&self) -> RepoResult<StoreReport> {
        Ok(StoreReport {
            genres: self.genre_sales(&GenreSalesQuery::default())?,
            employees: self.employee_sales()?,
            countries: self.country_sales()?,
            albums: self.album_report()?,
        })
    }
}

fn timed<T>(section: &str, run: impl FnOnce() -> RepoResult<Vec<T>>) -> RepoResult<Vec<T>> {
    let started_at = Instant::now();
    match run() {
        Ok(rows) => {
            info!(
                "event=report_section module=service status=ok section={} rows={} duration_ms={}",
                section,
                rows.len(),
                started_at.elapsed().as_millis()
            );
            Ok(rows)
        }
        Err(err) => {
            error!(
                "event=report_section module=service status=error section={} duration_ms={} error={}",
                section,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
