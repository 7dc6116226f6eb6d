//! Typed input validators.
//!
//! Each validator names the field it checks so the resulting [`Error`] is
//! enough for a caller to re-prompt. Extra constraints go through
//! [`with_check`].

use crate::{Error, Result};

/// Trimmed, non-empty text.
pub fn non_empty_text(field: &'static str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyField(field));
  }
  Ok(trimmed.to_owned())
}

/// A finite real within `min..=max`.
pub fn real_in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64> {
  if !value.is_finite() || value < min || value > max {
    return Err(Error::OutOfRange { field, value, min, max });
  }
  Ok(value)
}

/// An integer within `min..=max`.
pub fn integer_in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<i64> {
  if value < min || value > max {
    return Err(Error::OutOfRange {
      field,
      value: value as f64,
      min: min as f64,
      max: max as f64,
    });
  }
  Ok(value)
}

/// A finite real strictly above zero.
pub fn positive_real(field: &'static str, value: f64) -> Result<f64> {
  if !value.is_finite() || value <= 0.0 {
    return Err(Error::NonPositive { field, value });
  }
  Ok(value)
}

/// Apply an extra predicate to an already-validated value.
pub fn with_check<T>(
  value: T,
  predicate: impl FnOnce(&T) -> bool,
  error: impl FnOnce() -> Error,
) -> Result<T> {
  if predicate(&value) { Ok(value) } else { Err(error()) }
}
