//! The units of work a build runs: one per dimension, plus the fact unit.
//!
//! Each unit reads its inputs from the store and writes its output back to it.

use mart_core::{
  dimension::{CalendarRange, DimensionKind, DimensionSource, build_dimension},
  fact::{DimensionKeys, FactLoadMode, ResolveStats, resolve_sales_facts},
  resource::{SALES_ORDER_DETAIL, SALES_ORDER_HEADER},
  staging::StagedRelation,
  store::WarehouseStore,
};
use strum::IntoEnumIterator as _;

use crate::{Error, Result};

async fn require_staged<S: WarehouseStore>(
  store: &S,
  name: &str,
) -> Result<StagedRelation> {
  store
    .staged(name)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| mart_core::Error::StagedRelationMissing(name.to_owned()).into())
}

/// Rebuild dimension `kind` from scratch. Returns the number of rows written.
pub async fn dimension_unit<S: WarehouseStore>(
  store: &S,
  kind: DimensionKind,
  calendar: CalendarRange,
) -> Result<usize> {
  let staged = match kind.source() {
    DimensionSource::Staged(name) => Some(require_staged(store, name).await?),
    DimensionSource::Calendar | DimensionSource::Catalog => None,
  };

  let rows = build_dimension(kind, staged.as_ref(), calendar)?;
  let written = store.replace_dimension(rows).await.map_err(Error::store)?;
  tracing::info!(dimension = %kind, rows = written, "dimension rebuilt");
  Ok(written)
}

/// Resolve staged order lines against whatever dimensions exist and load the
/// result.
pub async fn fact_unit<S: WarehouseStore>(
  store: &S,
  mode: FactLoadMode,
) -> Result<ResolveStats> {
  let header = require_staged(store, SALES_ORDER_HEADER.name).await?;
  let detail = require_staged(store, SALES_ORDER_DETAIL.name).await?;

  let mut keys = DimensionKeys::new();
  for kind in DimensionKind::iter() {
    match store.dimension_keys(kind).await.map_err(Error::store)? {
      Some(index) => {
        if index.is_empty() {
          tracing::warn!(dimension = %kind, "dimension is empty, every key resolves to 0");
        } else {
          tracing::debug!(dimension = %kind, keys = index.len(), "key index loaded");
        }
        keys.insert(kind, index);
      }
      None => tracing::warn!(dimension = %kind, "dimension not built, every key resolves to 0"),
    }
  }

  let (facts, stats) = resolve_sales_facts(&header, &detail, &keys)?;
  if stats.orphan_details > 0 {
    tracing::warn!(rows = stats.orphan_details, "order lines without a header dropped");
  }
  for (kind, misses) in &stats.misses {
    tracing::warn!(dimension = %kind, rows = misses, "unresolved keys set to 0");
  }

  let written = store.load_facts(facts, mode).await.map_err(Error::store)?;
  tracing::info!(rows = written, mode = ?mode, "facts loaded");
  Ok(stats)
}
