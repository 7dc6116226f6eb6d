//! Error types for `canefield-core`.

use thiserror::Error;

use crate::reference::LossCategory;

/// Coarse classification of an [`Error`], used by callers to decide whether
/// to re-prompt, report "not found", or reject the input outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A farm, plot or harvest lookup missed.
  NotFound,
  /// Input failed a range, format, enumeration or uniqueness check.
  ValidationFailure,
  /// The total loss makes the potential-yield formula undefined.
  ArithmeticInvalid,
  /// The supplied reference data is unusable.
  Configuration,
}

#[derive(Debug, Error)]
pub enum Error {
  // ── NotFound ──────────────────────────────────────────────────────────────
  #[error("farm not found: {0}")]
  FarmNotFound(u32),

  #[error("plot {code:?} not found on farm {farm_id}")]
  PlotNotFound { farm_id: u32, code: String },

  #[error("harvest record not found: {0}")]
  HarvestNotFound(u32),

  // ── ValidationFailure ─────────────────────────────────────────────────────
  #[error("invalid document {0:?}: expected a valid 11-digit personal or 14-digit corporate id")]
  InvalidDocument(String),

  #[error("{0} must not be empty")]
  EmptyField(&'static str),

  #[error("{field} must be between {min} and {max}, got {value}")]
  OutOfRange {
    field: &'static str,
    value: f64,
    min:   f64,
    max:   f64,
  },

  #[error("{field} must be a positive number, got {value}")]
  NonPositive { field: &'static str, value: f64 },

  #[error("plot code {code:?} already exists on farm {farm_id}")]
  DuplicatePlotCode { farm_id: u32, code: String },

  #[error("unknown variety {0:?}")]
  UnknownVariety(String),

  #[error("unknown plot status {0:?}")]
  UnknownPlotStatus(String),

  #[error("invalid harvest date {input:?}: {reason}")]
  InvalidDate { input: String, reason: &'static str },

  #[error("unknown harvest method {0:?}")]
  InvalidMethod(String),

  #[error("productivity {value:.2} t/ha is outside {min}..={max}")]
  ProductivityOutOfRange { value: f64, min: f64, max: f64 },

  #[error("unknown loss category {0:?}")]
  UnknownLossCategory(String),

  #[error("loss category {0} entered more than once")]
  DuplicateLossCategory(LossCategory),

  #[error("{category} loss {value}% is outside {min}..={max}")]
  LossOutOfRange {
    category: LossCategory,
    value:    f64,
    min:      f64,
    max:      f64,
  },

  #[error("harvest record {0} is already in the ledger")]
  DuplicateHarvestId(u32),

  // ── ArithmeticInvalid ─────────────────────────────────────────────────────
  #[error("total loss {total_loss}% leaves no delivered fraction; potential yield is undefined")]
  ArithmeticInvalid { total_loss: f64 },

  // ── Configuration ─────────────────────────────────────────────────────────
  #[error("invalid reference data: {0}")]
  InvalidReference(String),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::FarmNotFound(_) | Self::PlotNotFound { .. } | Self::HarvestNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::ArithmeticInvalid { .. } => ErrorKind::ArithmeticInvalid,
      Self::InvalidReference(_) => ErrorKind::Configuration,
      _ => ErrorKind::ValidationFailure,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
