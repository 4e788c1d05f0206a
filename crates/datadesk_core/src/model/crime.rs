//! Boston crimes CSV record.
//!
//! # Invariants
//! - `Weekday` variants serialize to the exact labels used in the CSV and
//!   in the `weekday` enum type created on the server.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Day of the week as stored in `day_of_the_week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of `boston.csv`, in file column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    /// Primary key; the server column is a 32-bit `INTEGER`.
    pub incident_number: i32,
    pub offense_code: i32,
    pub description: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub day_of_the_week: Weekday,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

/// Column names of the crime table, in load order.
pub const CRIME_COLUMNS: &[&str] = &[
    "incident_number",
    "offense_code",
    "description",
    "date",
    "day_of_the_week",
    "lat",
    "long",
];
