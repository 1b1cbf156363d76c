//! Fixed-size rolling window statistics (mean and sample standard deviation).

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::IndicatorError;

/// Extra rolling-window policy options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingOptions {
    /// Label each window at its centre instead of its right edge.
    pub center: bool,
    /// Minimum number of non-missing observations required for a value.
    /// Defaults to the window size.
    pub min_periods: Option<usize>,
}

/// A validated rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingWindow {
    size: usize,
    center: bool,
    min_periods: usize,
}

impl RollingWindow {
    /// Validates `size` and `options` on behalf of `indicator`.
    pub fn new(
        indicator: &'static str,
        size: usize,
        options: RollingOptions,
    ) -> Result<Self, IndicatorError> {
        if size == 0 {
            return Err(IndicatorError::invalid_period(indicator, "window_size", size));
        }
        let min_periods = options.min_periods.unwrap_or(size);
        if min_periods > size {
            return Err(IndicatorError::invalid_configuration(
                indicator,
                format!("min_periods {min_periods} must not exceed window_size {size}"),
            ));
        }
        Ok(Self {
            size,
            center: options.center,
            min_periods,
        })
    }

    /// Window length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Positions of the observations contributing to row `row` of a series of length `len`.
    pub fn bounds(&self, row: usize, len: usize) -> Range<usize> {
        let offset = if self.center { (self.size - 1) / 2 } else { 0 };
        let label = (row + 1).saturating_add(offset);
        let end = label.min(len);
        let start = label.saturating_sub(self.size).min(end);
        start..end
    }

    /// Rolling arithmetic mean.
    pub fn mean(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        self.apply(values, |window| {
            if window.is_empty() {
                return None;
            }
            if is_flat(window) {
                return Some(window[0]);
            }
            Some(window.iter().sum::<f64>() / window.len() as f64)
        })
    }

    /// Rolling sample standard deviation (one degree of freedom).
    pub fn std(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        self.apply(values, |window| {
            if window.len() < 2 {
                return None;
            }
            if is_flat(window) {
                return Some(0.0);
            }
            let mean = window.iter().sum::<f64>() / window.len() as f64;
            let squares: f64 = window.iter().map(|v| (v - mean) * (v - mean)).sum();
            Some((squares / (window.len() - 1) as f64).sqrt())
        })
    }

    fn apply(
        &self,
        values: &[Option<f64>],
        stat: impl Fn(&[f64]) -> Option<f64>,
    ) -> Vec<Option<f64>> {
        let mut scratch = Vec::with_capacity(self.size.min(values.len()));
        (0..values.len())
            .map(|row| {
                scratch.clear();
                scratch.extend(values[self.bounds(row, values.len())].iter().flatten());
                if scratch.len() < self.min_periods {
                    None
                } else {
                    stat(&scratch).filter(|v| !v.is_nan())
                }
            })
            .collect()
    }
}

fn is_flat(window: &[f64]) -> bool {
    window.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(size: usize, center: bool, min_periods: Option<usize>) -> RollingWindow {
        RollingWindow::new("test", size, RollingOptions { center, min_periods }).unwrap()
    }

    fn series(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn waits_for_full_window() {
        let mean = window(3, false, None).mean(&series(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(mean, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn honours_min_periods() {
        let mean = window(3, false, Some(1)).mean(&series(&[1.0, 3.0, 5.0]));
        assert_eq!(mean, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn skips_missing_observations() {
        let mean = window(2, false, Some(1)).mean(&[None, Some(4.0), None]);
        assert_eq!(mean, vec![None, Some(4.0), Some(4.0)]);
    }

    #[test]
    fn centres_windows() {
        let win = window(3, true, None);
        assert_eq!(win.bounds(0, 5), 0..2);
        assert_eq!(win.bounds(1, 5), 0..3);
        assert_eq!(win.bounds(4, 5), 3..5);
        let mean = win.mean(&series(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(mean, vec![None, Some(2.0), Some(3.0), Some(4.0), None]);
    }

    #[test]
    fn sample_standard_deviation() {
        let std = window(5, false, None).std(&series(&[10.0, 11.0, 12.0, 13.0, 14.0]));
        let last = std[4].unwrap();
        assert!((last - 2.5_f64.sqrt()).abs() < 1e-12);
        assert!(std[..4].iter().all(Option::is_none));
    }

    #[test]
    fn flat_windows_are_exact() {
        let values = series(&[0.1, 0.1, 0.1]);
        let win = window(3, false, None);
        assert_eq!(win.mean(&values)[2], Some(0.1));
        assert_eq!(win.std(&values)[2], Some(0.0));
    }

    #[test]
    fn single_observation_has_no_deviation() {
        let std = window(1, false, None).std(&series(&[3.0]));
        assert_eq!(std, vec![None]);
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(RollingWindow::new("test", 0, RollingOptions::default()).is_err());
        let err = RollingWindow::new(
            "test",
            3,
            RollingOptions {
                center: false,
                min_periods: Some(4),
            },
        )
        .unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidConfiguration { .. }));
    }

    #[test]
    fn oversized_windows_yield_missing_values() {
        let values = series(&[1.0, 2.0, 3.0]);
        for center in [false, true] {
            let win = window(usize::MAX / 4, center, None);
            assert_eq!(win.mean(&values), vec![None; 3]);
            assert_eq!(win.std(&values), vec![None; 3]);
        }
        let win = window(usize::MAX, true, Some(1));
        assert_eq!(win.mean(&values), vec![Some(2.0); 3]);
    }
}
