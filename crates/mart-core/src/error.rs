//! Error types for `mart-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown resource: {0:?}")]
  UnknownResource(String),

  #[error("staged relation {0:?} is not available")]
  StagedRelationMissing(String),

  #[error("staged relation {relation:?} has no column {column:?}")]
  MissingColumn { relation: String, column: String },

  #[error("resource {resource:?} could not be decoded: {reason}")]
  Decode { resource: String, reason: String },

  #[error("invalid calendar range: {from} is after {through}")]
  InvalidCalendar {
    from:    chrono::NaiveDate,
    through: chrono::NaiveDate,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
