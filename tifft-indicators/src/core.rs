//! Foundational trait and error type shared by every calculator.

use thiserror::Error;

use crate::table::IndicatorTable;

/// A stateless transformation from a price series into a decorated result table.
///
/// Implementations are immutable once constructed, so a single instance may be shared
/// across threads and invoked any number of times.
pub trait Calculator {
    /// Ordered column names of the table produced by [`Calculator::calculate`].
    fn columns(&self) -> &'static [&'static str];

    /// Computes the indicator over `values`, where `None` marks a missing observation.
    ///
    /// The returned table always has one row per input position.
    fn calculate(&self, values: &[Option<f64>]) -> IndicatorTable;

    /// Convenience wrapper for series without missing observations.
    fn calculate_values(&self, values: &[f64]) -> IndicatorTable {
        let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        self.calculate(&values)
    }
}

/// Errors raised while configuring or selecting a calculator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    /// A parameter, or a combination of parameters, is invalid.
    #[error("invalid configuration for {indicator}: {reason}")]
    InvalidConfiguration {
        /// Name of the indicator being configured.
        indicator: &'static str,
        /// Human readable description of the violated constraint.
        reason: String,
    },
    /// The requested indicator name does not match any known calculator.
    #[error("invalid indicator: {0}")]
    InvalidIndicator(String),
}

impl IndicatorError {
    /// Helper for constructing [`IndicatorError::InvalidConfiguration`].
    pub fn invalid_configuration(indicator: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            indicator,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_period(indicator: &'static str, name: &str, period: usize) -> Self {
        Self::invalid_configuration(indicator, format!("{name} must be positive (got {period})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_configuration_errors() {
        let err = IndicatorError::invalid_period("MACD", "fast_span", 0);
        assert_eq!(
            err.to_string(),
            "invalid configuration for MACD: fast_span must be positive (got 0)"
        );
    }

    #[test]
    fn formats_unknown_indicator() {
        let err = IndicatorError::InvalidIndicator("adx".into());
        assert_eq!(err.to_string(), "invalid indicator: adx");
    }
}
