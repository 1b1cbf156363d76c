//! Built-in calculators and the smoothing kernels they share.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;

pub use bollinger::{BollingerBands, BollingerConfig, BOLLINGER_COLUMNS};
pub use ema::{Ema, EwmOptions};
pub use macd::{Macd, MacdConfig, MACD_COLUMNS};
pub use rolling::{RollingOptions, RollingWindow};
pub use rsi::{Rsi, RsiConfig, RSI_COLUMNS};
