//! Dimension tables and the builders that derive them.
//!
//! The set of dimensions is closed. Three are projected from a staged
//! relation (territory, product, customer); two have no upstream source at
//! all: status is a fixed literal catalog and time is synthesized over a
//! calendar range. [`build_dimension`] dispatches over that closed set.
//!
//! Builders only produce rows. Surrogate keys are assigned by the store when
//! the rows are written, except for time, whose key is the date itself.

mod calendar;
mod staged;
mod status;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, resource, staging::StagedRelation};

pub use calendar::{CalendarRange, DEFAULT_EPOCH, date_key};
pub use staged::{FINAL_CONSUMER, NOT_APPLICABLE};
pub use status::STATUS_CATALOG;

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// The five dimensions of the sales mart.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumIter,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DimensionKind {
  Time,
  Product,
  Customer,
  Territory,
  Status,
}

/// Where a dimension's rows come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionSource {
  /// Projected from the staged relation with this name.
  Staged(&'static str),
  /// Enumerated over a calendar range.
  Calendar,
  /// A fixed literal catalog baked into the builder.
  Catalog,
}

impl DimensionKind {
  pub fn source(self) -> DimensionSource {
    match self {
      Self::Time => DimensionSource::Calendar,
      Self::Status => DimensionSource::Catalog,
      Self::Product => DimensionSource::Staged(resource::PRODUCT.name),
      Self::Customer => DimensionSource::Staged(resource::CUSTOMER.name),
      Self::Territory => DimensionSource::Staged(resource::TERRITORY.name),
    }
  }

  /// Name of the warehouse table.
  pub fn table_name(self) -> &'static str {
    match self {
      Self::Time => "dim_tempo",
      Self::Product => "dim_produto",
      Self::Customer => "dim_cliente",
      Self::Territory => "dim_territorio",
      Self::Status => "dim_status",
    }
  }

  pub fn surrogate_key_column(self) -> &'static str {
    match self {
      Self::Time => "sk_tempo",
      Self::Product => "sk_produto",
      Self::Customer => "sk_cliente",
      Self::Territory => "sk_territorio",
      Self::Status => "sk_status",
    }
  }

  /// The column fact rows are matched against. For time this is the
  /// surrogate key itself: a date's natural key is its `YYYYMMDD` encoding.
  pub fn natural_key_column(self) -> &'static str {
    match self {
      Self::Time => "sk_tempo",
      Self::Product => "id_produto_original",
      Self::Customer => "id_cliente_original",
      Self::Territory => "id_territorio_original",
      Self::Status => "id_status_original",
    }
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TerritoryRow {
  pub id_territorio_original: i64,
  pub nome_territorio:        Option<String>,
  pub codigo_pais:            Option<String>,
  pub grupo:                  Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
  pub id_produto_original: i64,
  pub nome_produto:        Option<String>,
  pub numero_produto:      Option<String>,
  /// Never null; a missing colour is [`NOT_APPLICABLE`].
  pub cor:                 String,
  pub custo_padrao:        Option<f64>,
  pub preco_lista:         Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
  pub id_cliente_original: i64,
  pub nome_completo:       String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
  pub id_status_original: i64,
  pub nome_status:        String,
  pub flag_ativo:         bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
  pub data_completa:      NaiveDate,
  pub ano:                i32,
  pub mes:                u32,
  pub nome_mes:           &'static str,
  pub dia:                u32,
  pub trimestre:          u32,
  pub dia_da_semana:      &'static str,
  pub flag_fim_de_semana: bool,
  /// `YYYYMMDD` as an integer.
  pub sk_tempo:           i64,
}

/// The full contents of one dimension, ready to replace the stored table.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionRows {
  Time(Vec<TimeRow>),
  Product(Vec<ProductRow>),
  Customer(Vec<CustomerRow>),
  Territory(Vec<TerritoryRow>),
  Status(Vec<StatusRow>),
}

impl DimensionRows {
  pub fn kind(&self) -> DimensionKind {
    match self {
      Self::Time(_) => DimensionKind::Time,
      Self::Product(_) => DimensionKind::Product,
      Self::Customer(_) => DimensionKind::Customer,
      Self::Territory(_) => DimensionKind::Territory,
      Self::Status(_) => DimensionKind::Status,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::Time(r) => r.len(),
      Self::Product(r) => r.len(),
      Self::Customer(r) => r.len(),
      Self::Territory(r) => r.len(),
      Self::Status(r) => r.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Build the complete contents of dimension `kind`.
///
/// `staged` must be the relation named by [`DimensionKind::source`] for the
/// staged variants and is ignored otherwise. `calendar` is only read by the
/// time dimension.
pub fn build_dimension(
  kind: DimensionKind,
  staged: Option<&StagedRelation>,
  calendar: CalendarRange,
) -> Result<DimensionRows> {
  let rows = match kind {
    DimensionKind::Time => DimensionRows::Time(calendar.rows()),
    DimensionKind::Status => DimensionRows::Status(status::rows()),
    DimensionKind::Territory => {
      DimensionRows::Territory(staged::territory(staged_input(kind, staged)?)?)
    }
    DimensionKind::Product => {
      DimensionRows::Product(staged::product(staged_input(kind, staged)?)?)
    }
    DimensionKind::Customer => {
      DimensionRows::Customer(staged::customer(staged_input(kind, staged)?)?)
    }
  };
  Ok(rows)
}

/// The staged relation a staged dimension reads, checked by name.
fn staged_input(
  kind: DimensionKind,
  staged: Option<&StagedRelation>,
) -> Result<&StagedRelation> {
  let DimensionSource::Staged(name) = kind.source() else {
    return Err(Error::StagedRelationMissing(kind.to_string()));
  };
  staged
    .filter(|r| r.name() == name)
    .ok_or_else(|| Error::StagedRelationMissing(name.to_owned()))
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;
  use crate::resource::{PRODUCT, TERRITORY};

  fn calendar() -> CalendarRange {
    CalendarRange::new(
      NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    )
    .unwrap()
  }

  #[test]
  fn synthetic_dimensions_need_no_staged_input() {
    let time = build_dimension(DimensionKind::Time, None, calendar()).unwrap();
    assert_eq!(time.kind(), DimensionKind::Time);
    assert_eq!(time.len(), 31);

    let status =
      build_dimension(DimensionKind::Status, None, calendar()).unwrap();
    assert_eq!(status.len(), 5);
  }

  #[test]
  fn staged_dimension_without_input_fails() {
    let r = build_dimension(DimensionKind::Product, None, calendar());
    assert!(matches!(r, Err(Error::StagedRelationMissing(n)) if n == "product"));
  }

  #[test]
  fn staged_dimension_rejects_wrong_relation() {
    let wrong = StagedRelation::new("territory", TERRITORY.staged_columns(), vec![]);
    let r = build_dimension(DimensionKind::Product, Some(&wrong), calendar());
    assert!(matches!(r, Err(Error::StagedRelationMissing(_))));

    let right = StagedRelation::new("product", PRODUCT.staged_columns(), vec![]);
    let built =
      build_dimension(DimensionKind::Product, Some(&right), calendar()).unwrap();
    assert!(built.is_empty());
  }

  #[test]
  fn table_and_key_names_are_distinct() {
    let kinds: Vec<_> = DimensionKind::iter().collect();
    assert_eq!(kinds.len(), 5);
    for (i, a) in kinds.iter().enumerate() {
      for b in &kinds[i + 1..] {
        assert_ne!(a.table_name(), b.table_name());
        assert_ne!(a.surrogate_key_column(), b.surrogate_key_column());
      }
    }
  }

  #[test]
  fn kind_display_is_snake_case() {
    assert_eq!(DimensionKind::Territory.to_string(), "territory");
    let name: &'static str = DimensionKind::Time.into();
    assert_eq!(name, "time");
  }
}
