//! Precision-aware numeric equality (V-Equal).
//!
//! Two values are equal when, rounded to the lesser of their declared
//! precisions, they agree. Rounding is round-half-to-even on the exact decimal
//! text of the value, so `1000.5` at `decimals = 0` becomes `1000`.
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::ToleranceConfig;
use crate::store::Decimals;

/// Largest power of ten representable as a `Decimal` scale factor.
const MAX_POW10: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToleranceOutcome {
    pub equal: bool,
    pub rounded_a: f64,
    pub rounded_b: f64,
    pub comparison_decimals: Decimals,
    /// Absolute difference of the rounded values.
    pub difference: f64,
}

/// Rounds `value` to the given precision. `Unbounded` returns it unchanged.
pub fn round_to_decimals(value: f64, decimals: Decimals) -> f64 {
    let Decimals::Finite(places) = decimals else {
        return value;
    };
    let Ok(exact) = Decimal::from_str_exact(&value.to_string()) else {
        return value;
    };

    let rounded = if places >= 0 {
        Some(exact.round_dp_with_strategy(places as u32, RoundingStrategy::MidpointNearestEven))
    } else {
        let power = places.unsigned_abs();
        if power > MAX_POW10 {
            return 0.0;
        }
        let scale = Decimal::from_i128_with_scale(10_i128.pow(power), 0);
        exact
            .checked_div(scale)
            .map(|q| q.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
            .and_then(|q| q.checked_mul(scale))
    };

    rounded.and_then(|d| d.to_f64()).unwrap_or(value)
}

/// Half a unit in the last place of the comparison precision.
fn epsilon(decimals: Decimals) -> f64 {
    match decimals {
        Decimals::Finite(d) if d > 0 => 0.5 * 10f64.powi(-d),
        _ => 0.5,
    }
}

/// Compares two values at the lesser of their precisions.
pub fn compare(a: f64, b: f64, decimals_a: Decimals, decimals_b: Decimals) -> ToleranceOutcome {
    let comparison_decimals = decimals_a.lesser(decimals_b);
    let rounded_a = round_to_decimals(a, comparison_decimals);
    let rounded_b = round_to_decimals(b, comparison_decimals);
    let difference = (rounded_a - rounded_b).abs();

    ToleranceOutcome {
        equal: difference <= epsilon(comparison_decimals),
        rounded_a,
        rounded_b,
        comparison_decimals,
        difference,
    }
}

pub fn values_equal(a: f64, b: f64, decimals_a: Decimals, decimals_b: Decimals) -> bool {
    compare(a, b, decimals_a, decimals_b).equal
}

/// Like [`compare`], but when neither side declares a precision the check
/// falls back to an absolute tolerance for small magnitudes and a relative
/// one for large magnitudes.
pub fn within_tolerance(
    expected: f64,
    actual: f64,
    expected_decimals: Decimals,
    actual_decimals: Decimals,
    config: &ToleranceConfig,
) -> ToleranceOutcome {
    if !(expected_decimals.is_unbounded() && actual_decimals.is_unbounded()) {
        return compare(expected, actual, expected_decimals, actual_decimals);
    }

    let difference = (expected - actual).abs();
    let threshold = if expected.abs() < config.magnitude_threshold || actual.abs() < config.magnitude_threshold {
        config.absolute
    } else {
        config.relative * expected.abs().max(actual.abs())
    };

    ToleranceOutcome {
        equal: difference <= threshold,
        rounded_a: expected,
        rounded_b: actual,
        comparison_decimals: Decimals::Unbounded,
        difference,
    }
}
