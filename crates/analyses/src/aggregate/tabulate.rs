//! Categorical tabulations: value counts and two-way crosstabs

use rtplan_core::error::{Error, Result};
use rtplan_core::layer::{AttributeValue, Layer};
use std::collections::BTreeMap;

/// Count occurrences of each value of a column, sorted by value.
///
/// Null and absent values count under the empty string so the totals
/// always cover every record.
pub fn value_counts(layer: &Layer, column: &str) -> Result<Vec<(String, usize)>> {
    require_column(layer, column)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for feature in layer.iter() {
        let key = display_value(feature.get(column));
        *counts.entry(key).or_insert(0) += 1;
    }
    Ok(counts.into_iter().collect())
}

/// A two-way categorical count table
#[derive(Debug, Clone)]
pub struct Crosstab {
    /// Sorted labels of the row dimension
    pub row_labels: Vec<String>,
    /// Sorted labels of the column dimension
    pub col_labels: Vec<String>,
    /// `counts[r][c]` is the number of records with row label `r` and
    /// column label `c`
    pub counts: Vec<Vec<usize>>,
}

/// Cross-tabulate two categorical columns, labels sorted on both axes
pub fn crosstab(layer: &Layer, row_column: &str, col_column: &str) -> Result<Crosstab> {
    require_column(layer, row_column)?;
    require_column(layer, col_column)?;

    let mut cells: BTreeMap<(String, String), usize> = BTreeMap::new();
    for feature in layer.iter() {
        let row = display_value(feature.get(row_column));
        let col = display_value(feature.get(col_column));
        *cells.entry((row, col)).or_insert(0) += 1;
    }

    let mut row_labels: Vec<String> = cells.keys().map(|(r, _)| r.clone()).collect();
    row_labels.dedup();
    let mut col_labels: Vec<String> = cells.keys().map(|(_, c)| c.clone()).collect();
    col_labels.sort();
    col_labels.dedup();

    let counts = row_labels
        .iter()
        .map(|r| {
            col_labels
                .iter()
                .map(|c| {
                    cells
                        .get(&(r.clone(), c.clone()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    Ok(Crosstab {
        row_labels,
        col_labels,
        counts,
    })
}

fn display_value(value: Option<&AttributeValue>) -> String {
    match value {
        None | Some(AttributeValue::Null) => String::new(),
        Some(v) => v.to_string(),
    }
}

fn require_column(layer: &Layer, column: &str) -> Result<()> {
    if !layer.is_empty() && !layer.iter().any(|f| f.get(column).is_some()) {
        return Err(Error::MissingColumn {
            layer: layer.name().to_string(),
            column: column.to_string(),
        });
    }
    Ok(())
}
