//! The `WarehouseStore` trait.
//!
//! The store is the only channel between pipeline units: the staging step
//! writes staged relations, each dimension builder reads staged relations and
//! writes one dimension, and the fact builder reads staged relations plus the
//! dimension key indexes and writes facts. No unit hands data to another in
//! memory.
//!
//! The trait is implemented by storage backends (e.g. `mart-store-sqlite`).

use std::future::Future;

use crate::{
  dimension::{DimensionKind, DimensionRows},
  fact::{FactLoadMode, KeyIndex, SalesFact},
  staging::StagedRelation,
};

/// Abstraction over the relational store backing the mart.
///
/// All replace operations are failure-atomic: the new contents become visible
/// all at once or not at all, and the previous contents survive a failure.
///
/// All methods return `Send` futures so builders can run as independent tasks
/// on a multi-threaded runtime.
pub trait WarehouseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Staging ───────────────────────────────────────────────────────────

  /// Replace the staged relation named `relation.name()` wholesale. Returns
  /// the number of rows written.
  fn replace_staged(
    &self,
    relation: StagedRelation,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Read a staged relation. Returns `None` if it has never been staged.
  fn staged<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<StagedRelation>, Self::Error>> + Send + 'a;

  // ── Dimensions ────────────────────────────────────────────────────────

  /// Replace a dimension with `rows`, assigning surrogate keys. Returns the
  /// number of rows written.
  fn replace_dimension(
    &self,
    rows: DimensionRows,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Natural key → surrogate key for a dimension. Returns `None` if the
  /// dimension has not been built.
  fn dimension_keys(
    &self,
    kind: DimensionKind,
  ) -> impl Future<Output = Result<Option<KeyIndex>, Self::Error>> + Send + '_;

  /// Row count of a dimension, or `None` if it has not been built.
  fn dimension_len(
    &self,
    kind: DimensionKind,
  ) -> impl Future<Output = Result<Option<usize>, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Write a fact batch. Returns the number of rows written.
  fn load_facts(
    &self,
    facts: Vec<SalesFact>,
    mode: FactLoadMode,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Every stored fact row, in insertion order.
  fn facts(
    &self,
  ) -> impl Future<Output = Result<Vec<SalesFact>, Self::Error>> + Send + '_;
}
