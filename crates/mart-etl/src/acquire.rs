//! Acquisition of raw resources.
//!
//! A [`ResourceFetcher`] pulls a file from its remote source. The [`Acquirer`]
//! wraps one with a local cache: a successful fetch refreshes the cached copy,
//! a failed one falls back to it, and with neither the resource is skipped.

use std::{future::Future, path::PathBuf, time::Duration};

use bytes::Bytes;
use mart_core::resource::ResourceSpec;
use serde::Serialize;

use crate::error::FetchError;

/// Upper bound on a single remote request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub trait ResourceFetcher: Send + Sync {
  /// Fetch the raw bytes of `file_name`.
  fn fetch<'a>(
    &'a self,
    file_name: &'a str,
  ) -> impl Future<Output = Result<Bytes, FetchError>> + Send + 'a;
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// Fetches `<base_url><file_name>` over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client:   reqwest::Client,
  base_url: String,
}

impl HttpFetcher {
  pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .timeout(FETCH_TIMEOUT)
      .build()
      .map_err(FetchError::Client)?;

    let mut base_url = base_url.into();
    if !base_url.ends_with('/') {
      base_url.push('/');
    }
    Ok(Self { client, base_url })
  }
}

impl ResourceFetcher for HttpFetcher {
  async fn fetch(&self, file_name: &str) -> Result<Bytes, FetchError> {
    let url = format!("{}{file_name}", self.base_url);
    let request_err = |source| FetchError::Request {
      file_name: file_name.to_owned(),
      source,
    };

    let response = self.client.get(&url).send().await.map_err(request_err)?;
    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        file_name: file_name.to_owned(),
        status,
      });
    }

    response.bytes().await.map_err(request_err)
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Where an acquired payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Origin {
  Remote,
  Cache,
}

#[derive(Debug, Clone)]
pub struct Acquired {
  pub bytes:  Bytes,
  pub origin: Origin,
}

pub struct Acquirer<F> {
  fetcher:   F,
  cache_dir: PathBuf,
}

impl<F: ResourceFetcher> Acquirer<F> {
  pub fn new(fetcher: F, cache_dir: impl Into<PathBuf>) -> Self {
    Self { fetcher, cache_dir: cache_dir.into() }
  }

  fn cache_path(&self, spec: &ResourceSpec) -> PathBuf {
    self.cache_dir.join(spec.file_name)
  }

  /// Acquire `spec`, preferring the remote copy. Returns `None` when neither
  /// the remote source nor the cache can provide it. Never fails.
  pub async fn acquire(&self, spec: &ResourceSpec) -> Option<Acquired> {
    match self.fetcher.fetch(spec.file_name).await {
      Ok(bytes) => {
        self.refresh_cache(spec, &bytes).await;
        Some(Acquired { bytes, origin: Origin::Remote })
      }
      Err(err) => {
        tracing::warn!(resource = spec.name, error = %err, "fetch failed, trying cache");
        self.read_cache(spec).await
      }
    }
  }

  async fn refresh_cache(&self, spec: &ResourceSpec, bytes: &Bytes) {
    let path = self.cache_path(spec);
    let written = async {
      tokio::fs::create_dir_all(&self.cache_dir).await?;
      tokio::fs::write(&path, bytes).await
    }
    .await;

    if let Err(err) = written {
      tracing::warn!(path = %path.display(), error = %err, "could not update cache");
    }
  }

  async fn read_cache(&self, spec: &ResourceSpec) -> Option<Acquired> {
    let path = self.cache_path(spec);
    match tokio::fs::read(&path).await {
      Ok(bytes) => {
        tracing::info!(resource = spec.name, path = %path.display(), "using cached copy");
        Some(Acquired { bytes: Bytes::from(bytes), origin: Origin::Cache })
      }
      Err(err) => {
        tracing::warn!(
          resource = spec.name,
          path = %path.display(),
          error = %err,
          "no cached copy, skipping resource"
        );
        None
      }
    }
  }
}
