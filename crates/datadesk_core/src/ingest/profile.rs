//! Column profiling and type inference for CSV files.
//!
//! # Invariants
//! - Lengths are measured in characters, not bytes.
//! - Empty fields count toward `empty_count` and never affect the inferred
//!   kind.
//! - Inference order is Integer, Decimal, Date, Enum, Text.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const DEFAULT_ENUM_THRESHOLD: usize = 7;

#[derive(Debug)]
pub enum CsvProfileError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    /// The file has no header row.
    Empty,
}

impl Display for CsvProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to open `{}`: {source}", path.display()),
            Self::Csv(err) => write!(f, "{err}"),
            Self::Empty => write!(f, "csv input has no header row"),
        }
    }
}

impl Error for CsvProfileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
            Self::Empty => None,
        }
    }
}

impl From<csv::Error> for CsvProfileError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Inferred value kind of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Decimal,
    Date,
    /// Few distinct non-numeric labels.
    Enum,
    Text,
}

/// Profiling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Maximum distinct values for a text column to be inferred as `Enum`.
    pub enum_threshold: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            enum_threshold: DEFAULT_ENUM_THRESHOLD,
        }
    }
}

/// Statistics for one CSV column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub distinct_count: usize,
    pub max_len: usize,
    pub empty_count: usize,
    pub kind: ColumnKind,
    /// Distinct values, sorted, kept only for `Enum` columns.
    pub enum_values: Vec<String>,
}

impl ColumnProfile {
    /// PostgreSQL type suggested for this column.
    pub fn suggested_sql_type(&self) -> String {
        match self.kind {
            ColumnKind::Integer => "INTEGER".to_string(),
            ColumnKind::Decimal => "DECIMAL".to_string(),
            ColumnKind::Date => "DATE".to_string(),
            ColumnKind::Enum => "ENUM".to_string(),
            ColumnKind::Text => format!("VARCHAR({})", self.max_len.max(1)),
        }
    }
}

/// Profile of a whole CSV file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvProfile {
    pub header: Vec<String>,
    /// First data row, if the file has one.
    pub first_row: Option<Vec<String>>,
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

impl CsvProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Profiles the CSV file at `path`.
pub fn profile_csv(path: &Path, options: ProfileOptions) -> Result<CsvProfile, CsvProfileError> {
    let file = File::open(path).map_err(|source| CsvProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    profile_reader(file, options)
}

/// Profiles CSV data from any reader. The first record is the header.
pub fn profile_reader<R: Read>(
    input: R,
    options: ProfileOptions,
) -> Result<CsvProfile, CsvProfileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let header = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if header.is_empty() || header.iter().all(String::is_empty) {
        return Err(CsvProfileError::Empty);
    }

    let mut stats = header
        .iter()
        .map(|name| ColumnStats::new(name.clone()))
        .collect::<Vec<_>>();
    let mut first_row = None;
    let mut row_count = 0usize;

    for record in reader.records() {
        let record = record?;
        if first_row.is_none() {
            first_row = Some(record.iter().map(str::to_string).collect());
        }
        for (column, value) in stats.iter_mut().zip(record.iter()) {
            column.observe(value);
        }
        row_count += 1;
    }

    Ok(CsvProfile {
        header,
        first_row,
        row_count,
        columns: stats
            .into_iter()
            .map(|column| column.finish(options))
            .collect(),
    })
}

struct ColumnStats {
    name: String,
    distinct: HashSet<String>,
    max_len: usize,
    empty_count: usize,
    all_integer: bool,
    all_decimal: bool,
    all_date: bool,
}

impl ColumnStats {
    fn new(name: String) -> Self {
        Self {
            name,
            distinct: HashSet::new(),
            max_len: 0,
            empty_count: 0,
            all_integer: true,
            all_decimal: true,
            all_date: true,
        }
    }

    fn observe(&mut self, value: &str) {
        if value.is_empty() {
            self.empty_count += 1;
            return;
        }

        self.max_len = self.max_len.max(value.chars().count());
        if self.all_integer && value.parse::<i64>().is_err() {
            self.all_integer = false;
        }
        if self.all_decimal && value.parse::<f64>().map_or(true, |v| !v.is_finite()) {
            self.all_decimal = false;
        }
        if self.all_date && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
            self.all_date = false;
        }
        if !self.distinct.contains(value) {
            self.distinct.insert(value.to_string());
        }
    }

    fn finish(self, options: ProfileOptions) -> ColumnProfile {
        let observed = !self.distinct.is_empty();
        let kind = if !observed {
            ColumnKind::Text
        } else if self.all_integer {
            ColumnKind::Integer
        } else if self.all_decimal {
            ColumnKind::Decimal
        } else if self.all_date {
            ColumnKind::Date
        } else if self.distinct.len() <= options.enum_threshold {
            ColumnKind::Enum
        } else {
            ColumnKind::Text
        };

        let enum_values = if kind == ColumnKind::Enum {
            let mut values = self.distinct.iter().cloned().collect::<Vec<_>>();
            values.sort();
            values
        } else {
            Vec::new()
        };

        ColumnProfile {
            name: self.name,
            distinct_count: self.distinct.len(),
            max_len: self.max_len,
            empty_count: self.empty_count,
            kind,
            enum_values,
        }
    }
}
