//! Numeric policy shared by the calculators.
//!
//! Missing observations are represented as `None`. Arithmetic that yields `NaN`
//! (an indeterminate form such as `0/0`) is folded back into `None`, while infinities
//! are kept so that saturating quantities such as an unbounded strength ratio stay visible.

/// Tolerance used when snapping a nearly integral value to its nearest integer.
pub const FLOAT_TOLERANCE: f64 = 1e-10;

/// Replaces every missing value with the last observed one.
///
/// Leading missing values stay missing since nothing precedes them.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|value| {
            if value.is_some() {
                last = *value;
            }
            last
        })
        .collect()
}

/// First difference of the series. The first position, and any position next to a
/// missing value, is missing.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev = None;
    for value in values {
        out.push(match (*value, prev) {
            (Some(current), Some(previous)) => Some(current - previous),
            _ => None,
        });
        prev = *value;
    }
    out
}

/// Folds `NaN` into a missing value.
pub fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Element-wise combination of two aligned series; missing on either side yields missing.
pub fn zip_with(
    lhs: &[Option<f64>],
    rhs: &[Option<f64>],
    op: impl Fn(f64, f64) -> f64,
) -> Vec<Option<f64>> {
    lhs.iter()
        .zip(rhs)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => defined(op(*a, *b)),
            _ => None,
        })
        .collect()
}

/// Number of whole standard deviations contained in `value`, truncated toward zero.
///
/// Values within [`FLOAT_TOLERANCE`] of an integer snap to that integer. Missing and
/// non-finite inputs map to zero.
pub fn whole_units(value: Option<f64>) -> i32 {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return 0;
    };
    let nearest = value.round();
    let units = if (value - nearest).abs() <= FLOAT_TOLERANCE {
        nearest
    } else if value > 0.0 {
        value.floor()
    } else {
        value.ceil()
    };
    units.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}
