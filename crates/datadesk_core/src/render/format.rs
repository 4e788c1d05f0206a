//! `ResultSet` writers.

use crate::query::result_set::{CellValue, ResultSet};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::str::FromStr;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Aligned plain-text table; reals are shown with two decimals.
    #[default]
    Table,
    Csv,
    /// Array of objects keyed by column name.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unsupported output format `{other}`; expected table|csv|json"
            )),
        }
    }
}

#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to write output: {err}"),
            Self::Csv(err) => write!(f, "failed to write csv: {err}"),
            Self::Json(err) => write!(f, "failed to write json: {err}"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for RenderError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Writes `result` to `out` in `format`.
pub fn render<W: Write>(
    result: &ResultSet,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), RenderError> {
    match format {
        OutputFormat::Table => render_table(result, out),
        OutputFormat::Csv => render_csv(result, out),
        OutputFormat::Json => render_json(result, out),
    }
}

fn render_table<W: Write>(result: &ResultSet, out: &mut W) -> Result<(), RenderError> {
    let cells = result
        .rows
        .iter()
        .map(|row| row.iter().map(table_cell).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut widths = result
        .columns
        .iter()
        .map(|column| column.chars().count())
        .collect::<Vec<_>>();
    for row in &cells {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let numeric = (0..result.columns.len())
        .map(|index| {
            result.rows.iter().all(|row| {
                matches!(
                    row[index],
                    CellValue::Integer(_) | CellValue::Real(_) | CellValue::Null
                )
            })
        })
        .collect::<Vec<_>>();

    let header = result
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| pad(column, widths[index], numeric[index]))
        .collect::<Vec<_>>();
    writeln!(out, "{}", header.join("  ").trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>();
    writeln!(out, "{}", rule.join("  "))?;

    for row in &cells {
        let line = row
            .iter()
            .enumerate()
            .map(|(index, cell)| pad(cell, widths[index], numeric[index]))
            .collect::<Vec<_>>();
        writeln!(out, "{}", line.join("  ").trim_end())?;
    }

    writeln!(out, "({} rows)", result.len())?;
    Ok(())
}

fn table_cell(value: &CellValue) -> String {
    match value {
        CellValue::Real(value) => format!("{value:.2}"),
        other => other.to_string(),
    }
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{value:>width$}")
    } else {
        format!("{value:<width$}")
    }
}

fn render_csv<W: Write>(result: &ResultSet, out: &mut W) -> Result<(), RenderError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&result.columns)?;
    for row in &result.rows {
        writer.write_record(row.iter().map(CellValue::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

fn render_json<W: Write>(result: &ResultSet, out: &mut W) -> Result<(), RenderError> {
    let objects = result
        .rows
        .iter()
        .map(|row| {
            let mut object = Map::new();
            for (column, cell) in result.columns.iter().zip(row) {
                object.insert(column.clone(), serde_json::to_value(cell)?);
            }
            Ok(Value::Object(object))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    serde_json::to_writer_pretty(&mut *out, &objects)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render, OutputFormat};
    use crate::query::result_set::{CellValue, ResultSet};

    fn sample() -> ResultSet {
        let mut set = ResultSet::with_columns(&["genre", "tracks_sold", "percentage_sold"]);
        set.push_row(vec!["Rock".into(), CellValue::Integer(2635), CellValue::Real(55.3921)]);
        set.push_row(vec!["Metal, Heavy".into(), CellValue::Integer(619), CellValue::Null]);
        set
    }

    fn rendered(format: OutputFormat) -> String {
        let mut out = Vec::new();
        render(&sample(), format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn table_aligns_columns_and_rounds_reals() {
        let text = rendered(OutputFormat::Table);
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "genre         tracks_sold  percentage_sold");
        assert!(lines[2].starts_with("Rock "));
        assert!(lines[2].ends_with("55.39"));
        assert_eq!(lines.last().copied(), Some("(2 rows)"));
    }

    #[test]
    fn csv_quotes_embedded_commas() {
        let text = rendered(OutputFormat::Csv);
        assert!(text.starts_with("genre,tracks_sold,percentage_sold\n"));
        assert!(text.contains("\"Metal, Heavy\",619,\n"));
    }

    #[test]
    fn json_emits_objects_keyed_by_column() {
        let text = rendered(OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["genre"], "Rock");
        assert_eq!(parsed[0]["tracks_sold"], 2635);
        assert!(parsed[1]["percentage_sold"].is_null());
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
