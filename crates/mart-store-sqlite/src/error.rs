//! Error type for `mart-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Staged relation names become table names; only `[a-z0-9_]` is allowed.
  #[error("invalid relation name: {0:?}")]
  InvalidRelationName(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
