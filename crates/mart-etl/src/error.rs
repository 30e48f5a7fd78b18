//! Error types for `mart-etl`.

use thiserror::Error;

/// A resource could not be fetched from its remote source.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("could not build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("request for {file_name:?} failed: {source}")]
  Request {
    file_name: String,
    #[source]
    source:    reqwest::Error,
  },

  #[error("{file_name:?} answered with HTTP {status}")]
  Status {
    file_name: String,
    status:    reqwest::StatusCode,
  },
}

#[derive(Debug, Error)]
pub enum Error {
  /// A store operation failed. Boxed so the pipeline stays generic over the
  /// store backend.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Core(#[from] mart_core::Error),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("unit task aborted: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl Error {
  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
