//! Relative Strength Index (RSI).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Calculator, IndicatorError};
use crate::indicators::rolling::{RollingOptions, RollingWindow};
use crate::numeric::{diff, forward_fill, zip_with};
use crate::table::{ColumnData, IndicatorTable};

const NAME: &str = "RSI";

/// Output columns, in order.
pub const RSI_COLUMNS: &[&str] = &["value", "rs", "rsi", "signal"];

/// Parameters of [`Rsi`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    /// Rolling window length for the average gain and loss.
    pub window_size: usize,
    /// RSI level above which the series is considered overbought.
    pub upper_line: f64,
    /// RSI level below which the series is considered oversold.
    pub lower_line: f64,
    /// Extra windowing options.
    #[serde(flatten)]
    pub rolling: RollingOptions,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            window_size: 14,
            upper_line: 70.0,
            lower_line: 30.0,
            rolling: RollingOptions::default(),
        }
    }
}

/// Ratio of rolling average gains to average losses mapped into `[0, 100]`.
///
/// Uses a simple rolling mean of gains and losses rather than Wilder's smoothing.
/// A window with no movement at all leaves `rs` and `rsi` undefined.
#[derive(Debug, Clone)]
pub struct Rsi {
    config: RsiConfig,
    window: RollingWindow,
}

impl Rsi {
    /// Creates a new RSI calculator.
    pub fn new(config: RsiConfig) -> Result<Self, IndicatorError> {
        if !config.upper_line.is_finite() || !config.lower_line.is_finite() {
            return Err(IndicatorError::invalid_configuration(
                NAME,
                "upper_line and lower_line must be finite",
            ));
        }
        if config.lower_line > config.upper_line {
            return Err(IndicatorError::invalid_configuration(
                NAME,
                format!(
                    "lower_line ({}) must not exceed upper_line ({})",
                    config.lower_line, config.upper_line
                ),
            ));
        }
        let window = RollingWindow::new(NAME, config.window_size, config.rolling)?;
        debug!(?config, "configured rsi");
        Ok(Self { config, window })
    }

    /// Active configuration.
    pub fn config(&self) -> &RsiConfig {
        &self.config
    }

    fn classify(&self, rsi: Option<f64>) -> i32 {
        match rsi {
            Some(rsi) if rsi > self.config.upper_line => 1,
            Some(rsi) if rsi < self.config.lower_line => -1,
            _ => 0,
        }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(RsiConfig::default())
            .unwrap_or_else(|_| unreachable!("default lines are valid"))
    }
}

impl Calculator for Rsi {
    fn columns(&self) -> &'static [&'static str] {
        RSI_COLUMNS
    }

    fn calculate(&self, values: &[Option<f64>]) -> IndicatorTable {
        let change = diff(&forward_fill(values));
        let upward: Vec<_> = change
            .iter()
            .map(|d| d.map(|d| if d > 0.0 { d } else { 0.0 }))
            .collect();
        let downward: Vec<_> = change
            .iter()
            .map(|d| d.map(|d| if d < 0.0 { -d } else { 0.0 }))
            .collect();
        let avg_gain = self.window.mean(&upward);
        let avg_loss = self.window.mean(&downward);
        let rs = zip_with(&avg_gain, &avg_loss, |gain, loss| gain / loss);
        let rsi: Vec<_> = rs
            .iter()
            .map(|rs| rs.map(|rs| 100.0 - 100.0 / (1.0 + rs)))
            .collect();
        let signal = rsi.iter().map(|rsi| self.classify(*rsi)).collect();

        IndicatorTable::new(vec![
            ("value", ColumnData::Float(values.to_vec())),
            ("rs", ColumnData::Float(rs)),
            ("rsi", ColumnData::Float(rsi)),
            ("signal", ColumnData::Signal(signal)),
        ])
    }
}
