//! Generic tabular result shape.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// One cell of a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Real(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Text(if value { "yes" } else { "no" }.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Column names plus row-major cells.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_columns(columns: &[&str]) -> Self {
        Self::new(columns.iter().map(|name| (*name).to_string()).collect())
    }

    /// Appends one row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the cell at `row` for column `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&CellValue> {
        let index = self.column_index(name)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }
}

/// Conversion from typed report rows into a renderable [`ResultSet`].
pub trait IntoResultSet {
    fn into_result_set(self) -> ResultSet;
}
