//! Bollinger Bands built on a rolling mean and sample standard deviation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Calculator, IndicatorError};
use crate::indicators::rolling::{RollingOptions, RollingWindow};
use crate::numeric::{forward_fill, whole_units, zip_with};
use crate::table::{ColumnData, IndicatorTable};

const NAME: &str = "BollingerBands";

/// Output columns, in order.
pub const BOLLINGER_COLUMNS: &[&str] = &["value", "ma", "sd", "lower_bb", "upper_bb", "signal"];

/// Parameters of [`BollingerBands`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerConfig {
    /// Rolling window length.
    pub window_size: usize,
    /// Number of standard deviations between the middle and outer bands.
    pub sd_multiplier: f64,
    /// Extra windowing options.
    #[serde(flatten)]
    pub rolling: RollingOptions,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            sd_multiplier: 2.0,
            rolling: RollingOptions::default(),
        }
    }
}

/// Moving average plus/minus a multiple of the rolling standard deviation.
///
/// The signal is the signed number of whole standard deviations separating the
/// (forward-filled) value from its moving average.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    config: BollingerConfig,
    window: RollingWindow,
}

impl BollingerBands {
    /// Creates a new Bollinger Bands calculator.
    pub fn new(config: BollingerConfig) -> Result<Self, IndicatorError> {
        if !config.sd_multiplier.is_finite() || config.sd_multiplier.is_sign_negative() {
            return Err(IndicatorError::invalid_configuration(
                NAME,
                format!(
                    "sd_multiplier must be a non-negative number (got {})",
                    config.sd_multiplier
                ),
            ));
        }
        let window = RollingWindow::new(NAME, config.window_size, config.rolling)?;
        debug!(?config, "configured bollinger bands");
        Ok(Self { config, window })
    }

    /// Active configuration.
    pub fn config(&self) -> &BollingerConfig {
        &self.config
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new(BollingerConfig::default())
            .unwrap_or_else(|_| unreachable!("default window is valid"))
    }
}

impl Calculator for BollingerBands {
    fn columns(&self) -> &'static [&'static str] {
        BOLLINGER_COLUMNS
    }

    fn calculate(&self, values: &[Option<f64>]) -> IndicatorTable {
        let filled = forward_fill(values);
        let ma = self.window.mean(&filled);
        let sd = self.window.std(&filled);
        let k = self.config.sd_multiplier;
        let lower = zip_with(&ma, &sd, |ma, sd| ma - sd * k);
        let upper = zip_with(&ma, &sd, |ma, sd| ma + sd * k);
        let residual = zip_with(&filled, &ma, |value, ma| value - ma);
        let signal = zip_with(&residual, &sd, |offset, sd| offset / sd)
            .into_iter()
            .map(whole_units)
            .collect();

        IndicatorTable::new(vec![
            ("value", ColumnData::Float(values.to_vec())),
            ("ma", ColumnData::Float(ma)),
            ("sd", ColumnData::Float(sd)),
            ("lower_bb", ColumnData::Float(lower)),
            ("upper_bb", ColumnData::Float(upper)),
            ("signal", ColumnData::Signal(signal)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(lhs: f64, rhs: f64) {
        assert!((lhs - rhs).abs() <= 1e-8, "{lhs} != {rhs}");
    }

    fn bands(window_size: usize, sd_multiplier: f64) -> BollingerBands {
        BollingerBands::new(BollingerConfig {
            window_size,
            sd_multiplier,
            ..BollingerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn computes_expected_bands() {
        let table = bands(5, 2.0).calculate_values(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let ma = table.floats("ma").unwrap()[4].unwrap();
        let sd = table.floats("sd").unwrap()[4].unwrap();
        assert_close(ma, 12.0);
        assert_close(sd, 1.58113883);
        assert_close(table.floats("upper_bb").unwrap()[4].unwrap(), 15.16227766);
        assert_close(table.floats("lower_bb").unwrap()[4].unwrap(), 8.83772234);
        // (14 - 12) / 1.58 = 1.26 standard deviations
        assert_eq!(table.signals().unwrap()[4], 1);
    }

    #[test]
    fn flat_then_breakout() {
        let table = bands(3, 2.0).calculate_values(&[100.0, 100.0, 100.0, 110.0, 120.0]);
        let ma = table.floats("ma").unwrap();
        let sd = table.floats("sd").unwrap();
        let lower = table.floats("lower_bb").unwrap();
        let upper = table.floats("upper_bb").unwrap();

        assert_eq!(sd[2], Some(0.0));
        assert_eq!(ma[2], Some(100.0));
        assert_eq!(lower[2], Some(100.0));
        assert_eq!(upper[2], Some(100.0));
        assert_eq!(table.signals().unwrap()[2], 0);

        let (ma4, sd4) = (ma[4].unwrap(), sd[4].unwrap());
        assert!(sd4 > 0.0);
        assert!(lower[4].unwrap() < ma4 && ma4 < upper[4].unwrap());
        assert_close(ma4, 110.0);
        assert_close(sd4, 10.0);
        assert_eq!(table.signals().unwrap()[4], 1);
    }

    #[test]
    fn signal_snaps_exact_multiples() {
        // residual at index 2 is exactly one standard deviation: (3 - 2) / 1
        let table = bands(3, 2.0).calculate_values(&[1.0, 2.0, 3.0]);
        assert_eq!(table.signals().unwrap()[2], 1);
        let table = bands(3, 2.0).calculate_values(&[3.0, 2.0, 1.0]);
        assert_eq!(table.signals().unwrap()[2], -1);
    }

    #[test]
    fn preserves_missing_values_but_fills_internally() {
        let values = [Some(1.0), None, Some(3.0), None];
        let table = bands(2, 1.0).calculate(&values);
        assert_eq!(table.floats("value").unwrap(), &values[..]);
        let ma = table.floats("ma").unwrap();
        assert_eq!(ma[1], Some(1.0));
        assert_eq!(ma[2], Some(2.0));
        assert_eq!(ma[3], Some(3.0));
    }

    #[test]
    fn degenerate_inputs_keep_schema() {
        let calculator = BollingerBands::default();
        let empty = calculator.calculate(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.column_names(), BOLLINGER_COLUMNS);

        let single = calculator.calculate_values(&[42.0]);
        assert_eq!(single.len(), 1);
        assert_eq!(single.floats("value").unwrap(), &[Some(42.0)][..]);
        for name in ["ma", "sd", "lower_bb", "upper_bb"] {
            assert_eq!(single.floats(name).unwrap(), &[None][..], "{name}");
        }
        assert_eq!(single.signals().unwrap(), &[0][..]);
    }

    #[test]
    fn min_periods_emits_early_values() {
        let calculator = BollingerBands::new(BollingerConfig {
            window_size: 3,
            sd_multiplier: 2.0,
            rolling: RollingOptions {
                center: false,
                min_periods: Some(2),
            },
        })
        .unwrap();
        let table = calculator.calculate_values(&[1.0, 3.0, 5.0]);
        assert_eq!(table.floats("ma").unwrap()[1], Some(2.0));
        assert_eq!(table.floats("ma").unwrap()[0], None);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let err = BollingerBands::new(BollingerConfig {
            sd_multiplier: -1.0,
            ..BollingerConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidConfiguration { .. }));

        let err = BollingerBands::new(BollingerConfig {
            window_size: 0,
            ..BollingerConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidConfiguration { .. }));
    }

    #[test]
    fn window_longer_than_series_is_missing() {
        let calculator = BollingerBands::new(BollingerConfig {
            window_size: usize::MAX / 4,
            ..BollingerConfig::default()
        })
        .unwrap();
        let table = calculator.calculate_values(&[1.0, 2.0, 3.0]);
        assert_eq!(table.floats("ma").unwrap(), &[None; 3][..]);
        assert_eq!(table.floats("sd").unwrap(), &[None; 3][..]);
        assert_eq!(table.signals().unwrap(), &[0; 3][..]);
    }
}
