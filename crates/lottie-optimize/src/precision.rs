//! # Numeric Rounding
//!
//! Float-to-text expansion (`0.8333333333333334`) dominates the size of an
//! exported animation. These helpers bound every float leaf to a fixed number
//! of decimal places. Integers are never touched, and a float that rounds to a
//! whole number is written back as an integer.

use lottie_data::model::number_from_f64;
use serde_json::{Number, Value};

/// Magnitudes at or above this carry no fractional digits worth rounding.
const MAX_ROUNDABLE: f64 = 1.0e15;

/// Rounds `x` half away from zero to `precision` decimal places.
///
/// Non-finite and very large values are returned unchanged.
pub fn round_f64(x: f64, precision: u32) -> f64 {
    if !x.is_finite() || x.abs() >= MAX_ROUNDABLE {
        return x;
    }
    let factor = 10f64.powi(precision.min(15) as i32);
    let scaled = x * factor;
    if !scaled.is_finite() || scaled.abs() >= MAX_ROUNDABLE {
        return x;
    }
    scaled.round() / factor
}

/// Returns the rounded replacement for a float `n`, or `None` when `n` is an
/// integer or cannot be represented after rounding.
pub fn round_number(n: &Number, precision: u32) -> Option<Number> {
    if !n.is_f64() {
        return None;
    }
    let x = n.as_f64()?;
    number_from_f64(round_f64(x, precision))
}

/// Rounds every numeric leaf of `value` in place.
pub fn round_value(value: &mut Value, precision: u32) {
    match value {
        Value::Number(n) => {
            if let Some(rounded) = round_number(n, precision) {
                *n = rounded;
            }
        }
        Value::Array(items) => {
            for item in items {
                round_value(item, precision);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                round_value(item, precision);
            }
        }
        Value::String(_) | Value::Bool(_) | Value::Null => {}
    }
}

/// Non-mutating form of [`round_value`].
pub fn rounded(value: &Value, precision: u32) -> Value {
    let mut copy = value.clone();
    round_value(&mut copy, precision);
    copy
}
