//! Per-unit retry policy.

use std::{fmt::Display, future::Future, time::Duration};

use serde::{Deserialize, Serialize};

/// How often a failed unit is re-attempted, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Attempts after the first one.
  pub retries:    u32,
  pub delay_secs: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { retries: 1, delay_secs: 60 } }
}

/// The final result of a retried operation and the attempts it took.
#[derive(Debug)]
pub struct Attempted<T, E> {
  pub result:   Result<T, E>,
  pub attempts: u32,
}

impl RetryPolicy {
  pub fn no_delay(retries: u32) -> Self { Self { retries, delay_secs: 0 } }

  pub fn max_attempts(&self) -> u32 { self.retries.saturating_add(1) }

  pub fn delay(&self) -> Duration { Duration::from_secs(self.delay_secs) }

  /// Run `op` until it succeeds or the attempts are exhausted. `op` receives
  /// the 1-based attempt number.
  pub async fn run<T, E, F, Fut>(&self, unit: &str, mut op: F) -> Attempted<T, E>
  where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let max_attempts = self.max_attempts();
    let mut attempt = 1;
    loop {
      match op(attempt).await {
        Ok(value) => return Attempted { result: Ok(value), attempts: attempt },
        Err(err) if attempt >= max_attempts => {
          tracing::error!(unit, attempt, error = %err, "attempts exhausted");
          return Attempted { result: Err(err), attempts: attempt };
        }
        Err(err) => {
          tracing::warn!(
            unit,
            attempt,
            max_attempts,
            delay_secs = self.delay_secs,
            error = %err,
            "attempt failed, retrying"
          );
          tokio::time::sleep(self.delay()).await;
          attempt += 1;
        }
      }
    }
  }
}
