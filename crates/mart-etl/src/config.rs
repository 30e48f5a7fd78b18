//! Runtime configuration, deserialized from `mart.toml` and `MART_*`
//! environment variables.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use mart_core::{dimension::DEFAULT_EPOCH, fact::FactLoadMode};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

pub const DEFAULT_SOURCE_BASE_URL: &str =
  "https://raw.githubusercontent.com/datasets/adventure-works/main/data/";

#[derive(Debug, Clone, Deserialize)]
pub struct MartConfig {
  /// Path of the SQLite database holding both staging and warehouse tables.
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  #[serde(default = "default_source_base_url")]
  pub source_base_url: String,
  /// Last successfully fetched copy of every resource.
  #[serde(default = "default_cache_dir")]
  pub cache_dir:       PathBuf,
  #[serde(default)]
  pub pipeline:        PipelineConfig,
}

fn default_store_path() -> PathBuf { PathBuf::from("mart.db") }

fn default_source_base_url() -> String { DEFAULT_SOURCE_BASE_URL.to_owned() }

fn default_cache_dir() -> PathBuf { PathBuf::from("data") }

/// When the fact unit may run once every dimension unit is terminal.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TriggerRule {
  /// Run regardless of how the dimension units ended.
  #[default]
  AllDone,
  /// Run only if every dimension unit succeeded.
  AllSuccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// First day of the time dimension.
  pub time_epoch: NaiveDate,
  pub fact_load:  FactLoadMode,
  pub trigger:    TriggerRule,
  pub retry:      RetryPolicy,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      time_epoch: DEFAULT_EPOCH,
      fact_load:  FactLoadMode::default(),
      trigger:    TriggerRule::default(),
      retry:      RetryPolicy::default(),
    }
  }
}

impl MartConfig {
  /// Expand a leading `~` in the configured paths.
  pub fn expand_paths(mut self) -> Self {
    self.store_path = expand_tilde(&self.store_path);
    self.cache_dir = expand_tilde(&self.cache_dir);
    self
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
