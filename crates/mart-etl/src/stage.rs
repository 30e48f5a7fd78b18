//! The staging step: acquire resources, parse them and replace their staged
//! relations.

use mart_core::{
  resource::{self, RESOURCES, ResourceSpec},
  staging::{ParseReport, decode, parse_tsv},
  store::WarehouseStore,
};
use serde::Serialize;

use crate::{
  Error, Result,
  acquire::{Acquirer, Origin, ResourceFetcher},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
  Staged {
    origin: Origin,
    #[serde(flatten)]
    parse:  ParseReport,
  },
  /// Nothing was written; any previously staged relation is kept.
  Skipped { reason: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StageReport {
  pub resources: Vec<(&'static str, StageOutcome)>,
}

impl StageReport {
  pub fn outcome(&self, resource: &str) -> Option<&StageOutcome> {
    self
      .resources
      .iter()
      .find(|(name, _)| *name == resource)
      .map(|(_, outcome)| outcome)
  }

  pub fn staged_count(&self) -> usize {
    self
      .resources
      .iter()
      .filter(|(_, o)| matches!(o, StageOutcome::Staged { .. }))
      .count()
  }
}

/// Stage one resource.
///
/// Acquisition and decoding problems are absorbed into
/// [`StageOutcome::Skipped`]. Only a store failure is an error.
pub async fn stage_resource<F, S>(
  acquirer: &Acquirer<F>,
  store: &S,
  spec: &'static ResourceSpec,
) -> Result<StageOutcome>
where
  F: ResourceFetcher,
  S: WarehouseStore,
{
  let Some(acquired) = acquirer.acquire(spec).await else {
    return Ok(StageOutcome::Skipped { reason: "unavailable".into() });
  };

  let text = match decode(spec.name, &acquired.bytes) {
    Ok(text) => text,
    Err(err) => {
      tracing::warn!(resource = spec.name, error = %err, "skipping undecodable resource");
      return Ok(StageOutcome::Skipped { reason: err.to_string() });
    }
  };

  let (relation, parse) = parse_tsv(spec, &text);
  if parse.dropped > 0 {
    tracing::warn!(
      resource = spec.name,
      dropped = parse.dropped,
      "dropped over-long or unreadable records"
    );
  }

  let rows = store.replace_staged(relation).await.map_err(Error::store)?;
  tracing::info!(resource = spec.name, rows, origin = %acquired.origin, "staged");

  Ok(StageOutcome::Staged { origin: acquired.origin, parse })
}

/// Resolve resource names against the catalog. No names selects the whole
/// catalog; an unknown name is an error.
pub fn select<N: AsRef<str>>(names: &[N]) -> Result<Vec<&'static ResourceSpec>> {
  if names.is_empty() {
    return Ok(RESOURCES.to_vec());
  }
  names
    .iter()
    .map(|name| resource::lookup(name.as_ref()).map_err(Error::from))
    .collect()
}

/// Stage `resources` in the given order.
pub async fn stage<F, S>(
  acquirer: &Acquirer<F>,
  store: &S,
  resources: &[&'static ResourceSpec],
) -> Result<StageReport>
where
  F: ResourceFetcher,
  S: WarehouseStore,
{
  let mut report = StageReport::default();
  for &spec in resources {
    let outcome = stage_resource(acquirer, store, spec).await?;
    report.resources.push((spec.name, outcome));
  }
  Ok(report)
}

/// Stage every resource in the catalog, in catalog order.
pub async fn stage_all<F, S>(acquirer: &Acquirer<F>, store: &S) -> Result<StageReport>
where
  F: ResourceFetcher,
  S: WarehouseStore,
{
  stage(acquirer, store, &RESOURCES).await
}
