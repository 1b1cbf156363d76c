use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

/// A named column of a [`PriceFrame`].
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    /// Column header.
    pub name: String,
    /// One value per frame row; `None` is missing.
    pub values: Vec<Option<f64>>,
}

impl Series {
    /// Creates a named column.
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Date-indexed table of observations, sorted by date.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceFrame {
    index: Vec<NaiveDate>,
    columns: Vec<Series>,
    primary: usize,
}

impl PriceFrame {
    /// Builds a frame from an index and aligned columns. Rows are sorted by date.
    pub fn new(index: Vec<NaiveDate>, columns: Vec<Series>) -> Result<Self> {
        if let Some(series) = columns.iter().find(|s| s.values.len() != index.len()) {
            bail!(
                "column {} has {} rows but the index has {}",
                series.name,
                series.values.len(),
                index.len()
            );
        }
        let mut order: Vec<usize> = (0..index.len()).collect();
        order.sort_by_key(|&row| index[row]);
        let index = order.iter().map(|&row| index[row]).collect();
        let columns = columns
            .into_iter()
            .map(|series| Series {
                values: order.iter().map(|&row| series.values[row]).collect(),
                name: series.name,
            })
            .collect();
        Ok(Self {
            index,
            columns,
            primary: 0,
        })
    }

    /// Marks the column called `name` as the primary data column.
    pub fn with_primary(mut self, name: &str) -> Result<Self> {
        self.primary = self
            .columns
            .iter()
            .position(|series| series.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("column {name} not found"))?;
        Ok(self)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Row dates in ascending order.
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|s| s.name.as_str()).collect()
    }

    /// Column with the exact header `name`.
    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|s| s.name == name)
    }

    /// The column indicators are computed on.
    pub fn primary(&self) -> Option<&Series> {
        self.columns.get(self.primary)
    }

    /// Joins two frames on date, keeping every date present in either one.
    ///
    /// The primary column of `self` stays primary.
    pub fn outer_join(self, other: PriceFrame) -> PriceFrame {
        let width = self.columns.len() + other.columns.len();
        let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for (offset, frame) in [(0, &self), (self.columns.len(), &other)] {
            for (row, date) in frame.index.iter().enumerate() {
                let cells = rows.entry(*date).or_insert_with(|| vec![None; width]);
                for (col, series) in frame.columns.iter().enumerate() {
                    if series.values[row].is_some() {
                        cells[offset + col] = series.values[row];
                    }
                }
            }
        }

        let names: Vec<String> = self
            .columns
            .iter()
            .chain(&other.columns)
            .map(|s| s.name.clone())
            .collect();
        let index: Vec<NaiveDate> = rows.keys().copied().collect();
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(col, name)| Series::new(name, rows.values().map(|cells| cells[col]).collect()))
            .collect();
        PriceFrame {
            index,
            columns,
            primary: self.primary,
        }
    }

    /// Removes every row holding at least one missing value.
    #[must_use]
    pub fn drop_na(self) -> PriceFrame {
        let keep: Vec<bool> = (0..self.len())
            .map(|row| self.columns.iter().all(|s| s.values[row].is_some()))
            .collect();
        self.retain_rows(&keep)
    }

    /// Keeps rows dated within `[start, end]`; open bounds are unbounded.
    #[must_use]
    pub fn between(self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> PriceFrame {
        let keep: Vec<bool> = self
            .index
            .iter()
            .map(|date| start.map_or(true, |s| *date >= s) && end.map_or(true, |e| *date <= e))
            .collect();
        self.retain_rows(&keep)
    }

    fn retain_rows(self, keep: &[bool]) -> PriceFrame {
        let filter = |values: Vec<Option<f64>>| -> Vec<Option<f64>> {
            values
                .into_iter()
                .zip(keep)
                .filter_map(|(value, keep)| keep.then_some(value))
                .collect()
        };
        PriceFrame {
            index: self
                .index
                .into_iter()
                .zip(keep)
                .filter_map(|(date, keep)| keep.then_some(date))
                .collect(),
            columns: self
                .columns
                .into_iter()
                .map(|series| Series {
                    values: filter(series.values),
                    name: series.name,
                })
                .collect(),
            primary: self.primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn frame(name: &str, rows: &[(u32, Option<f64>)]) -> PriceFrame {
        PriceFrame::new(
            rows.iter().map(|(day, _)| date(*day)).collect(),
            vec![Series::new(name, rows.iter().map(|(_, v)| *v).collect())],
        )
        .unwrap()
    }

    #[test]
    fn sorts_rows_by_date() {
        let frame = frame("A", &[(3, Some(3.0)), (1, Some(1.0)), (2, None)]);
        assert_eq!(frame.index(), &[date(1), date(2), date(3)]);
        assert_eq!(frame.primary().unwrap().values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn rejects_misaligned_columns() {
        let err = PriceFrame::new(vec![date(1)], vec![Series::new("A", vec![])]).unwrap_err();
        assert!(err.to_string().contains("column A"));
    }

    #[test]
    fn outer_join_unions_dates() {
        let left = frame("A", &[(1, Some(1.0)), (2, Some(2.0))]);
        let right = frame("B", &[(2, Some(20.0)), (3, Some(30.0))]);
        let joined = left.outer_join(right);
        assert_eq!(joined.column_names(), vec!["A", "B"]);
        assert_eq!(joined.index(), &[date(1), date(2), date(3)]);
        assert_eq!(joined.columns()[0].values, vec![Some(1.0), Some(2.0), None]);
        assert_eq!(joined.columns()[1].values, vec![None, Some(20.0), Some(30.0)]);
        assert_eq!(joined.primary().unwrap().name, "A");
    }

    #[test]
    fn drop_na_removes_incomplete_rows() {
        let left = frame("A", &[(1, Some(1.0)), (2, None), (3, Some(3.0))]);
        let right = frame("B", &[(1, Some(1.0)), (3, Some(3.0))]);
        let cleaned = left.outer_join(right).drop_na();
        assert_eq!(cleaned.index(), &[date(1), date(3)]);
        assert_eq!(cleaned.columns()[1].values, vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn filters_by_date_range() {
        let frame = frame("A", &[(1, Some(1.0)), (2, Some(2.0)), (3, Some(3.0))]);
        let window = frame.between(Some(date(2)), None);
        assert_eq!(window.index(), &[date(2), date(3)]);
        let window = window.between(None, Some(date(2)));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn selects_primary_column_by_name() {
        let frame = PriceFrame::new(
            vec![date(1)],
            vec![Series::new("Open", vec![Some(1.0)]), Series::new("Close", vec![Some(2.0)])],
        )
        .unwrap()
        .with_primary("close")
        .unwrap();
        assert_eq!(frame.primary().unwrap().name, "Close");
        assert!(frame.with_primary("Volume").is_err());
    }
}
