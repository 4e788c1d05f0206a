//! Pre-flight validation of the crime CSV.
//!
//! # Responsibility
//! - Deserialize every row into `CrimeRecord` before any server work.
//! - Catch rows the server would reject during `COPY`: bad types, unknown
//!   weekdays, malformed dates, duplicate primary keys, oversized text.
//!
//! # Invariants
//! - Reported line numbers are 1-based, count the header line, and point
//!   at the physical line where the record starts.
//! - The header must list `CRIME_COLUMNS` in order, since `COPY` loads by
//!   position.

use crate::model::crime::{CrimeRecord, CRIME_COLUMNS};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
pub enum CrimeCsvError {
    Io { path: PathBuf, source: std::io::Error },
    /// The row at `line` cannot be loaded.
    Row { line: u64, message: String },
}

impl Display for CrimeCsvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to open `{}`: {source}", path.display()),
            Self::Row { line, message } => write!(f, "line {line}: {message}"),
        }
    }
}

impl Error for CrimeCsvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Row { .. } => None,
        }
    }
}

/// Facts about a CSV that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrimeCsvSummary {
    pub row_count: u64,
    pub max_description_len: usize,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

/// Validates the crime CSV at `path` against a description width limit.
pub fn validate_crime_csv(
    path: &Path,
    max_description_len: usize,
) -> Result<CrimeCsvSummary, CrimeCsvError> {
    let file = File::open(path).map_err(|source| CrimeCsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    validate_crime_reader(file, max_description_len)
}

/// Validates crime CSV data from any reader.
pub fn validate_crime_reader<R: Read>(
    input: R,
    max_description_len: usize,
) -> Result<CrimeCsvSummary, CrimeCsvError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);
    let headers = reader.headers().map_err(row_error)?.clone();
    if !headers.iter().eq(CRIME_COLUMNS.iter().copied()) {
        return Err(CrimeCsvError::Row {
            line: 1,
            message: format!(
                "header `{}` does not match `{}`",
                headers.iter().collect::<Vec<_>>().join(","),
                CRIME_COLUMNS.join(",")
            ),
        });
    }

    let mut seen = HashSet::new();
    let mut summary = CrimeCsvSummary {
        row_count: 0,
        max_description_len: 0,
        first_date: None,
        last_date: None,
    };

    let mut first_date: Option<NaiveDate> = None;
    let mut last_date: Option<NaiveDate> = None;
    let mut raw = csv::StringRecord::new();
    while reader.read_record(&mut raw).map_err(row_error)? {
        let line = raw.position().map_or(0, csv::Position::line);
        let record: CrimeRecord = raw
            .deserialize(Some(&headers))
            .map_err(|err| CrimeCsvError::Row {
                line,
                message: err.to_string(),
            })?;

        let date = NaiveDate::parse_from_str(&record.date, DATE_FORMAT).map_err(|err| {
            CrimeCsvError::Row {
                line,
                message: format!("date `{}` is not a valid YYYY-MM-DD date: {err}", record.date),
            }
        })?;

        let description_len = record.description.chars().count();
        if description_len > max_description_len {
            return Err(CrimeCsvError::Row {
                line,
                message: format!(
                    "description has {description_len} characters; column allows {max_description_len}"
                ),
            });
        }

        if !seen.insert(record.incident_number) {
            return Err(CrimeCsvError::Row {
                line,
                message: format!("duplicate incident_number {}", record.incident_number),
            });
        }

        summary.max_description_len = summary.max_description_len.max(description_len);
        first_date = Some(first_date.map_or(date, |first| first.min(date)));
        last_date = Some(last_date.map_or(date, |last| last.max(date)));
        summary.row_count += 1;
    }

    summary.first_date = first_date.map(|date| date.format(DATE_FORMAT).to_string());
    summary.last_date = last_date.map(|date| date.format(DATE_FORMAT).to_string());
    Ok(summary)
}

fn row_error(err: csv::Error) -> CrimeCsvError {
    let line = err.position().map_or(0, csv::Position::line);
    CrimeCsvError::Row {
        line,
        message: err.to_string(),
    }
}
