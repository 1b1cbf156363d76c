//! Typed selection of a calculator by kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Calculator, IndicatorError};
use crate::indicators::{
    BollingerBands, BollingerConfig, Macd, MacdConfig, Rsi, RsiConfig, BOLLINGER_COLUMNS,
    MACD_COLUMNS, RSI_COLUMNS,
};

/// The three supported indicator families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Moving-average volatility bands (Bollinger Bands, `bb`).
    Bands,
    /// Trend-momentum divergence (MACD, `macd`).
    Divergence,
    /// Bounded momentum oscillator (RSI, `rsi`).
    Oscillator,
}

impl IndicatorKind {
    /// Every kind, in display order.
    pub const ALL: [IndicatorKind; 3] = [Self::Bands, Self::Divergence, Self::Oscillator];

    /// Short command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bands => "bb",
            Self::Divergence => "macd",
            Self::Oscillator => "rsi",
        }
    }

    /// Human readable name used in console output.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Bands => "Bollinger Bands",
            Self::Divergence => "MACD",
            Self::Oscillator => "RSI",
        }
    }

    /// Output columns produced by this kind of calculator.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Bands => BOLLINGER_COLUMNS,
            Self::Divergence => MACD_COLUMNS,
            Self::Oscillator => RSI_COLUMNS,
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = IndicatorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bb" | "bands" | "bollinger" => Ok(Self::Bands),
            "macd" | "divergence" => Ok(Self::Divergence),
            "rsi" | "oscillator" => Ok(Self::Oscillator),
            _ => Err(IndicatorError::InvalidIndicator(value.to_string())),
        }
    }
}

/// An indicator kind paired with its typed configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorSpec {
    /// Bollinger Bands configuration.
    Bands(BollingerConfig),
    /// MACD configuration.
    Divergence(MacdConfig),
    /// RSI configuration.
    Oscillator(RsiConfig),
}

impl IndicatorSpec {
    /// Default configuration for `kind`.
    pub fn default_for(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Bands => Self::Bands(BollingerConfig::default()),
            IndicatorKind::Divergence => Self::Divergence(MacdConfig::default()),
            IndicatorKind::Oscillator => Self::Oscillator(RsiConfig::default()),
        }
    }

    /// Kind of indicator described by this spec.
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Self::Bands(_) => IndicatorKind::Bands,
            Self::Divergence(_) => IndicatorKind::Divergence,
            Self::Oscillator(_) => IndicatorKind::Oscillator,
        }
    }

    /// Primary parameters as `(name, value)` pairs, in declaration order.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Bands(cfg) => vec![
                ("window_size", cfg.window_size.to_string()),
                ("sd_multiplier", cfg.sd_multiplier.to_string()),
            ],
            Self::Divergence(cfg) => vec![
                ("fast_ema_span", cfg.fast_span.to_string()),
                ("slow_ema_span", cfg.slow_span.to_string()),
                ("macd_ema_span", cfg.signal_span.to_string()),
            ],
            Self::Oscillator(cfg) => vec![
                ("window_size", cfg.window_size.to_string()),
                ("upper_line", cfg.upper_line.to_string()),
                ("lower_line", cfg.lower_line.to_string()),
            ],
        }
    }

    /// Validates the configuration and constructs the calculator.
    pub fn build(&self) -> Result<Box<dyn Calculator + Send + Sync>, IndicatorError> {
        Ok(match *self {
            Self::Bands(cfg) => Box::new(BollingerBands::new(cfg)?),
            Self::Divergence(cfg) => Box::new(Macd::new(cfg)?),
            Self::Oscillator(cfg) => Box::new(Rsi::new(cfg)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("bb".parse::<IndicatorKind>().unwrap(), IndicatorKind::Bands);
        assert_eq!("Bands".parse::<IndicatorKind>().unwrap(), IndicatorKind::Bands);
        assert_eq!("MACD".parse::<IndicatorKind>().unwrap(), IndicatorKind::Divergence);
        assert_eq!("oscillator".parse::<IndicatorKind>().unwrap(), IndicatorKind::Oscillator);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "stoch".parse::<IndicatorKind>().unwrap_err();
        assert_eq!(err, IndicatorError::InvalidIndicator("stoch".into()));
    }

    #[test]
    fn builds_every_kind() {
        for kind in IndicatorKind::ALL {
            let spec = IndicatorSpec::default_for(kind);
            assert_eq!(spec.kind(), kind);
            let calculator = spec.build().unwrap();
            assert_eq!(calculator.columns(), kind.columns());
            let table = calculator.calculate_values(&[1.0, 2.0, 3.0]);
            assert_eq!(table.column_names(), kind.columns());
            assert_eq!(table.len(), 3);
        }
    }

    #[test]
    fn build_propagates_validation() {
        let spec = IndicatorSpec::Divergence(MacdConfig {
            fast_span: 30,
            ..MacdConfig::default()
        });
        assert!(matches!(
            spec.build(),
            Err(IndicatorError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn lists_parameters() {
        let params = IndicatorSpec::default_for(IndicatorKind::Divergence).parameters();
        assert_eq!(params[0], ("fast_ema_span", "12".to_string()));
        assert_eq!(params.len(), 3);
    }
}
