//! Column-oriented result table returned by every calculator.

use std::fmt;

/// Storage for a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Floating point values; `None` marks a missing entry.
    Float(Vec<Option<f64>>),
    /// Categorical signal codes. Signals are never missing.
    Signal(Vec<i32>),
}

impl ColumnData {
    /// Number of entries held by the column.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(values) => values.len(),
            Self::Signal(values) => values.len(),
        }
    }

    /// Returns `true` when the column holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, row: usize) -> Option<Cell> {
        match self {
            Self::Float(values) => values.get(row).copied().map(Cell::Float),
            Self::Signal(values) => values.get(row).copied().map(Cell::Signal),
        }
    }
}

/// Named column of an [`IndicatorTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column header.
    pub name: String,
    /// Column values.
    pub data: ColumnData,
}

/// A single value read from an [`IndicatorTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// Floating point entry (possibly missing).
    Float(Option<f64>),
    /// Signal entry.
    Signal(i32),
}

impl Cell {
    /// Returns the numeric value of the cell, if present.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(value) => value,
            Self::Signal(code) => Some(f64::from(code)),
        }
    }

    /// Returns `true` for a missing floating point entry.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Float(None))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(Some(value)) if value.is_infinite() => {
                f.write_str(if *value > 0.0 { "inf" } else { "-inf" })
            }
            Self::Float(Some(value)) => match f.precision() {
                Some(precision) => write!(f, "{value:.precision$}"),
                None => write!(f, "{value}"),
            },
            Self::Float(None) => f.write_str("NaN"),
            Self::Signal(code) => write!(f, "{code}"),
        }
    }
}

/// Ordered, fixed-schema table with one row per input observation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    columns: Vec<Column>,
    rows: usize,
}

impl IndicatorTable {
    /// Builds a table from `(name, data)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if the columns do not share the same length; calculators always produce
    /// aligned columns so this indicates a programming error.
    pub fn new(columns: Vec<(&str, ColumnData)>) -> Self {
        let rows = columns.first().map(|(_, data)| data.len()).unwrap_or(0);
        assert!(
            columns.iter().all(|(_, data)| data.len() == rows),
            "indicator columns must share the same length"
        );
        Self {
            columns: columns
                .into_iter()
                .map(|(name, data)| Column {
                    name: name.to_string(),
                    data,
                })
                .collect(),
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns `true` when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column headers in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns the values of a floating point column.
    pub fn floats(&self, name: &str) -> Option<&[Option<f64>]> {
        match &self.column(name)?.data {
            ColumnData::Float(values) => Some(values),
            ColumnData::Signal(_) => None,
        }
    }

    /// Returns the first signal column.
    pub fn signals(&self) -> Option<&[i32]> {
        self.columns.iter().find_map(|column| match &column.data {
            ColumnData::Signal(values) => Some(values.as_slice()),
            ColumnData::Float(_) => None,
        })
    }

    /// Reads a single cell.
    pub fn value_at(&self, row: usize, name: &str) -> Option<Cell> {
        self.column(name)?.data.cell(row)
    }

    /// Iterates over rows, yielding one cell per column.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Cell>> + '_ {
        (0..self.rows).map(move |row| {
            self.columns
                .iter()
                .filter_map(|column| column.data.cell(row))
                .collect()
        })
    }

    /// Returns a copy of the table with every header upper-cased, as used for display.
    #[must_use]
    pub fn with_uppercase_headers(mut self) -> Self {
        for column in &mut self.columns {
            column.name = column.name.to_uppercase();
        }
        self
    }
}
