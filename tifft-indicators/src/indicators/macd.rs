//! Moving Average Convergence Divergence indicator implementation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Calculator, IndicatorError};
use crate::indicators::ema::{Ema, EwmOptions};
use crate::numeric::{forward_fill, zip_with};
use crate::table::{ColumnData, IndicatorTable};

const NAME: &str = "MACD";

/// Output columns, in order.
pub const MACD_COLUMNS: &[&str] = &["value", "macd", "macd_ema", "signal"];

/// Parameters of [`Macd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    /// Span of the fast EMA.
    pub fast_span: usize,
    /// Span of the slow EMA. Must exceed `fast_span`.
    pub slow_span: usize,
    /// Span of the EMA applied to the MACD line.
    pub signal_span: usize,
    /// Extra smoothing options shared by all three EMAs.
    #[serde(flatten)]
    pub ewm: EwmOptions,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_span: 12,
            slow_span: 26,
            signal_span: 9,
            ewm: EwmOptions::default(),
        }
    }
}

/// Fast/slow EMA spread and its own exponential smoothing.
///
/// Signal codes: `2` MACD above its EMA while positive, `1` above its EMA otherwise,
/// `-2` below its EMA while negative, `-1` below its EMA otherwise, `0` when equal or undefined.
#[derive(Debug, Clone)]
pub struct Macd {
    config: MacdConfig,
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Macd {
    /// Create a MACD calculator with custom fast/slow/signal spans.
    pub fn new(config: MacdConfig) -> Result<Self, IndicatorError> {
        if config.fast_span == 0 {
            return Err(IndicatorError::invalid_period(NAME, "fast_span", config.fast_span));
        }
        if config.slow_span == 0 {
            return Err(IndicatorError::invalid_period(NAME, "slow_span", config.slow_span));
        }
        if config.signal_span == 0 {
            return Err(IndicatorError::invalid_period(
                NAME,
                "signal_span",
                config.signal_span,
            ));
        }
        if config.fast_span >= config.slow_span {
            return Err(IndicatorError::invalid_configuration(
                NAME,
                format!(
                    "fast_span ({}) must be less than slow_span ({})",
                    config.fast_span, config.slow_span
                ),
            ));
        }
        let macd = Self {
            config,
            fast: Ema::new(NAME, config.fast_span, config.ewm)?,
            slow: Ema::new(NAME, config.slow_span, config.ewm)?,
            signal: Ema::new(NAME, config.signal_span, config.ewm)?,
        };
        debug!(?config, "configured macd");
        Ok(macd)
    }

    /// Active configuration.
    pub fn config(&self) -> &MacdConfig {
        &self.config
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(MacdConfig::default())
            .unwrap_or_else(|_| unreachable!("default spans are valid"))
    }
}

fn classify(macd: Option<f64>, delta: Option<f64>) -> i32 {
    match (delta, macd) {
        (Some(delta), Some(macd)) if delta > 0.0 && macd > 0.0 => 2,
        (Some(delta), _) if delta > 0.0 => 1,
        (Some(delta), Some(macd)) if delta < 0.0 && macd < 0.0 => -2,
        (Some(delta), _) if delta < 0.0 => -1,
        _ => 0,
    }
}

impl Calculator for Macd {
    fn columns(&self) -> &'static [&'static str] {
        MACD_COLUMNS
    }

    fn calculate(&self, values: &[Option<f64>]) -> IndicatorTable {
        let filled = forward_fill(values);
        let macd = zip_with(&self.fast.apply(&filled), &self.slow.apply(&filled), |f, s| f - s);
        let macd_ema = self.signal.apply(&macd);
        let delta = zip_with(&macd, &macd_ema, |line, smoothed| line - smoothed);
        let signal = macd
            .iter()
            .zip(&delta)
            .map(|(macd, delta)| classify(*macd, *delta))
            .collect();

        IndicatorTable::new(vec![
            ("value", ColumnData::Float(values.to_vec())),
            ("macd", ColumnData::Float(macd)),
            ("macd_ema", ColumnData::Float(macd_ema)),
            ("signal", ColumnData::Signal(signal)),
        ])
    }
}
