//! Column-oriented table with nullable cells
//!
//! This module holds the minimal data model needed to reason about missing
//! values: named columns of optional cells, all of the same length.
//!
//! # Serialization
//!
//! A table deserializes from a JSON array of records. A `null` value and an
//! absent key both mean "missing":
//!
//! ```json
//! [
//!   { "day": "Mon", "temp": 12.5, "wind": 3.0 },
//!   { "day": "Tue", "temp": 4.0,  "wind": null },
//!   { "day": "Wed", "temp": 9.5 }
//! ]
//! ```
//!
//! Columns are ordered by name.

use std::collections::{BTreeMap, BTreeSet};

use permute_stats::distribution::OrderedF64;
use serde::{Deserialize, Serialize};

/// A single observed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Totally ordered form of this cell, used when the column is treated as categorical.
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Cell::Bool(b) => Category::Bool(*b),
            Cell::Number(n) => Category::Number(OrderedF64(*n)),
            Cell::Text(s) => Category::Text(s.clone()),
        }
    }
}

/// Categorical view of a [`Cell`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
pub enum Category {
    Bool(bool),
    Number(OrderedF64),
    Text(String),
}

/// How the values of a column are compared between groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Nominal values, compared with total variation distance.
    Categorical,
    /// Ordered numeric values, compared with the Kolmogorov–Smirnov statistic.
    Quantitative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Option<Cell>>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, cells: Vec<Option<Cell>>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Per-row flag: `true` where the cell is missing.
    pub fn is_missing(&self) -> impl Iterator<Item = bool> + '_ {
        self.cells.iter().map(Option::is_none)
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.is_missing().filter(|&m| m).count()
    }

    /// Fraction of rows that are missing; 0 for an empty column.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn missing_rate(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.missing_count() as f64 / self.cells.len() as f64
    }

    /// Quantitative when every present cell is a number, categorical otherwise.
    ///
    /// A column with no present cells is categorical.
    #[must_use]
    pub fn infer_kind(&self) -> ColumnKind {
        let mut present = self.cells.iter().flatten().peekable();
        if present.peek().is_some() && present.all(|c| matches!(c, Cell::Number(_))) {
            ColumnKind::Quantitative
        } else {
            ColumnKind::Categorical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("column '{name}' has {len} rows but the table has {rows}")]
    RaggedColumn { name: String, len: usize, rows: usize },
    #[display("column '{name}' appears more than once")]
    DuplicateColumn { name: String },
}

/// A set of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<BTreeMap<String, Option<Cell>>>")]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let rows = columns.first().map_or(0, Column::len);
        let mut names = BTreeSet::new();
        for column in &columns {
            if column.len() != rows {
                return Err(TableError::RaggedColumn {
                    name: column.name.clone(),
                    len: column.len(),
                    rows,
                });
            }
            if !names.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Builds a table from records; keys absent from a record are missing cells.
    #[must_use]
    pub fn from_records(records: Vec<BTreeMap<String, Option<Cell>>>) -> Self {
        let names = records
            .iter()
            .flat_map(BTreeMap::keys)
            .cloned()
            .collect::<BTreeSet<_>>();
        let mut columns = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(records.len())))
            .collect::<Vec<_>>();
        let rows = records.len();
        for mut record in records {
            for column in &mut columns {
                column.cells.push(record.remove(&column.name).flatten());
            }
        }
        Self { columns, rows }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl From<Vec<BTreeMap<String, Option<Cell>>>> for Table {
    fn from(records: Vec<BTreeMap<String, Option<Cell>>>) -> Self {
        Self::from_records(records)
    }
}
