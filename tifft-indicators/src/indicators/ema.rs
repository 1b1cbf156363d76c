//! Exponential Moving Average (EMA).

use serde::{Deserialize, Serialize};

use crate::core::IndicatorError;

/// Extra exponential-smoothing policy options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EwmOptions {
    /// Correct the weights for the finite start of the series.
    ///
    /// When `false` (the default) the average follows the plain recursion
    /// `ema[i] = alpha * x[i] + (1 - alpha) * ema[i - 1]` seeded with the first observation.
    pub adjust: bool,
    /// Minimum number of observations required before a value is emitted.
    pub min_periods: usize,
}

/// Span-parameterised exponential smoothing, validated once and reusable across series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    span: usize,
    alpha: f64,
    options: EwmOptions,
}

impl Ema {
    /// Creates an EMA with `alpha = 2 / (span + 1)`.
    pub fn new(
        indicator: &'static str,
        span: usize,
        options: EwmOptions,
    ) -> Result<Self, IndicatorError> {
        if span == 0 {
            return Err(IndicatorError::invalid_period(indicator, "span", span));
        }
        Ok(Self {
            span,
            alpha: 2.0 / (span as f64 + 1.0),
            options,
        })
    }

    /// Configured span.
    pub fn span(&self) -> usize {
        self.span
    }

    /// Smoothing factor derived from the span.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smooths `values`. Leading missing values stay missing; later gaps carry the
    /// previous average forward while its weight keeps decaying.
    pub fn apply(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut state = EmaState::new(self);
        values.iter().map(|value| state.next(*value)).collect()
    }
}

struct EmaState {
    decay: f64,
    new_weight: f64,
    adjust: bool,
    min_periods: usize,
    weighted: Option<f64>,
    old_weight: f64,
    observations: usize,
}

impl EmaState {
    fn new(ema: &Ema) -> Self {
        Self {
            decay: 1.0 - ema.alpha,
            new_weight: if ema.options.adjust { 1.0 } else { ema.alpha },
            adjust: ema.options.adjust,
            min_periods: ema.options.min_periods.max(1),
            weighted: None,
            old_weight: 1.0,
            observations: 0,
        }
    }

    fn next(&mut self, value: Option<f64>) -> Option<f64> {
        match (self.weighted, value) {
            (None, Some(value)) => {
                self.weighted = Some(value);
                self.old_weight = 1.0;
                self.observations = 1;
            }
            (Some(current), value) => {
                self.old_weight *= self.decay;
                if let Some(value) = value {
                    self.observations += 1;
                    if current != value {
                        let blended = (self.old_weight * current + self.new_weight * value)
                            / (self.old_weight + self.new_weight);
                        self.weighted = Some(blended);
                    }
                    self.old_weight = if self.adjust {
                        self.old_weight + self.new_weight
                    } else {
                        1.0
                    };
                }
            }
            (None, None) => {}
        }

        if self.observations >= self.min_periods {
            self.weighted
        } else {
            None
        }
    }
}
