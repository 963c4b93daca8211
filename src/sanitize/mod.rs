//! Input validation and result checks
//!
//! - Domain checks run before any computation
//! - Result checks turn non-finite or out-of-range values into numeric errors

use crate::error::{ModelError, Result};

/// Check whether a slice contains NaN or Inf
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// Reject anything that is not a strictly positive finite real
pub fn ensure_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ModelError::domain(name, value))
    }
}

/// Reject values outside the open unit interval
pub fn ensure_open_unit(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(ModelError::domain(name, value))
    }
}

/// Every intermediate must be finite
pub fn ensure_finite(operation: &'static str, values: &[f64]) -> Result<()> {
    if has_invalid_values(values) {
        return Err(ModelError::numeric(
            operation,
            format!("non-finite intermediate in {values:?}"),
        ));
    }
    Ok(())
}

/// A computed probability must be finite and within `[0, 1]`
pub fn ensure_probability(operation: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ModelError::numeric(
            operation,
            format!("probability {value} outside [0, 1]"),
        ))
    }
}

/// Mean and variance of a probability must describe a proper Beta:
/// `0 < mean < 1` and `0 < variance < mean * (1 - mean)`
pub fn ensure_valid_moments(operation: &'static str, mean: f64, variance: f64) -> Result<()> {
    ensure_finite(operation, &[mean, variance])?;

    if !(mean > 0.0 && mean < 1.0) {
        return Err(ModelError::numeric(
            operation,
            format!("mean {mean} outside (0, 1)"),
        ));
    }

    let bound = mean * (1.0 - mean);
    if !(variance > 0.0 && variance < bound) {
        return Err(ModelError::numeric(
            operation,
            format!("variance {variance} outside (0, {bound})"),
        ));
    }

    Ok(())
}

/// Prediction moments may sit on the boundary (`p^k` collapses to 0 for huge
/// `k`) but must stay within `[0, 1]` and `[0, 0.25]`.
///
/// A variance within `1e-15` below zero is rounding and is clipped to zero.
pub fn clamp_prediction_moments(operation: &'static str, mean: f64, variance: f64) -> Result<(f64, f64)> {
    ensure_finite(operation, &[mean, variance])?;

    if !(0.0..=1.0).contains(&mean) {
        return Err(ModelError::numeric(
            operation,
            format!("mean {mean} outside [0, 1]"),
        ));
    }

    let variance = if variance < 0.0 && variance > -ROUNDING_SLACK {
        0.0
    } else {
        variance
    };
    if !(0.0..=0.25).contains(&variance) {
        return Err(ModelError::numeric(
            operation,
            format!("variance {variance} outside [0, 0.25]"),
        ));
    }

    Ok((mean, variance))
}

const ROUNDING_SLACK: f64 = 1e-15;
