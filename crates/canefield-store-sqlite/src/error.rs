//! Error type for `canefield-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enumeration value no longer names a known variant.
  #[error("unknown {field} value in database: {value:?}")]
  UnknownValue { field: &'static str, value: String },

  /// A loss row refers to a harvest that is not in the mirror.
  #[error("loss rows reference missing harvest {0}")]
  OrphanLoss(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
