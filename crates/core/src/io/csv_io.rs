//! Delimited tabular I/O and presentation formatting
//!
//! Aggregation results stay numeric until they reach this boundary;
//! percent strings and fixed-precision rounding happen here and only here.

use crate::error::{Error, Result};
use crate::layer::Layer;
use std::path::Path;

/// An ordered table of display-ready cells
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Table {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; the cell count must match the header
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Other(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}

/// Write a table as a delimited file with a header row.
///
/// `include_index` prepends a zero-based row-index column, matching the
/// summaries that keep their category labels in the index position.
pub fn write_csv(path: impl AsRef<Path>, table: &Table, include_index: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    if include_index {
        let mut header = vec!["".to_string()];
        header.extend(table.columns().iter().cloned());
        writer.write_record(&header)?;
        for (index, row) in table.rows().iter().enumerate() {
            let mut record = vec![index.to_string()];
            record.extend(row.iter().cloned());
            writer.write_record(&record)?;
        }
    } else {
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Read a delimited file with a header row into a table
pub fn read_csv(path: impl AsRef<Path>) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(|c| c.to_string()).collect())?;
    }
    Ok(table)
}

/// Render a numeric fraction as a fixed-precision percent string.
///
/// The NaN sentinel produced by zero-denominator shares renders as an
/// empty cell.
pub fn percent_string(fraction: f64, decimals: usize) -> String {
    if fraction.is_nan() {
        String::new()
    } else {
        format!("{:.*}%", decimals, fraction * 100.0)
    }
}

/// Fixed-precision numeric cell
pub fn number_string(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{:.*}", decimals, value)
    }
}

/// Project layer attributes into a table, one row per feature.
///
/// Fails with [`Error::MissingColumn`] when a requested column is carried
/// by no feature at all; per-feature absences render as empty cells.
pub fn layer_table(layer: &Layer, columns: &[&str]) -> Result<Table> {
    for column in columns {
        if !layer.is_empty() && !layer.iter().any(|f| f.get(column).is_some()) {
            return Err(Error::MissingColumn {
                layer: layer.name().to_string(),
                column: column.to_string(),
            });
        }
    }
    let mut table = Table::new(columns.iter().copied());
    for feature in layer.iter() {
        let row = columns
            .iter()
            .map(|c| feature.get(c).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        table.push_row(row)?;
    }
    Ok(table)
}
