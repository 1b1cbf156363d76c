#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

//! Stateless technical indicator calculators over `f64` price series.

/// Foundational trait and error type.
pub mod core;
/// Built-in indicator implementations.
pub mod indicators;
/// Typed indicator selection.
pub mod kind;
/// Missing-value and rounding policy shared by the calculators.
pub mod numeric;
/// Result table returned by every calculator.
pub mod table;

/// Re-export of the core trait and error type to make the crate easy to consume.
pub use crate::core::{Calculator, IndicatorError};
/// Re-export of the calculators and their configuration.
pub use crate::indicators::{
    BollingerBands, BollingerConfig, EwmOptions, Macd, MacdConfig, RollingOptions, Rsi, RsiConfig,
};
/// Re-export of the indicator selection types.
pub use crate::kind::{IndicatorKind, IndicatorSpec};
/// Re-export of the table types.
pub use crate::table::{Cell, Column, ColumnData, IndicatorTable};
