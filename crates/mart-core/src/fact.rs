//! The sales fact table and the key resolver that produces it.
//!
//! Staged order details are inner-joined to their order headers, then every
//! foreign natural key is looked up in the matching dimension. A lookup that
//! finds nothing resolves to [`SENTINEL_KEY`] instead of dropping the row:
//! every joined detail row yields exactly one fact row.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  dimension::{DimensionKind, date_key},
  resource,
  staging::{StagedRelation, parse_integer},
};

/// Surrogate key meaning "no matching dimension row". No dimension assigns it.
pub const SENTINEL_KEY: i64 = 0;

// ─── Key indexes ─────────────────────────────────────────────────────────────

/// Natural key → surrogate key for one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyIndex {
  keys: HashMap<i64, i64>,
}

impl KeyIndex {
  /// Build from `(natural, surrogate)` pairs. When a natural key repeats, the
  /// lowest surrogate key wins.
  pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, i64)>) -> Self {
    let mut keys = HashMap::new();
    for (natural, surrogate) in pairs {
      keys
        .entry(natural)
        .and_modify(|sk: &mut i64| *sk = (*sk).min(surrogate))
        .or_insert(surrogate);
    }
    Self { keys }
  }

  pub fn get(&self, natural: i64) -> Option<i64> {
    self.keys.get(&natural).copied()
  }

  pub fn len(&self) -> usize { self.keys.len() }

  pub fn is_empty(&self) -> bool { self.keys.is_empty() }
}

/// The key indexes of whichever dimensions currently exist.
#[derive(Debug, Clone, Default)]
pub struct DimensionKeys {
  indexes: HashMap<DimensionKind, KeyIndex>,
}

impl DimensionKeys {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, kind: DimensionKind, index: KeyIndex) {
    self.indexes.insert(kind, index);
  }

  /// Resolve `natural` against `kind`, falling back to the sentinel when the
  /// key is absent, unmatched, or the dimension does not exist.
  pub fn resolve(&self, kind: DimensionKind, natural: Option<i64>) -> i64 {
    natural
      .and_then(|n| self.indexes.get(&kind)?.get(n))
      .unwrap_or(SENTINEL_KEY)
  }
}

// ─── Fact rows ───────────────────────────────────────────────────────────────

/// One row of `fato_vendas`.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesFact {
  pub sk_produto:         i64,
  pub sk_cliente:         i64,
  pub sk_tempo:           i64,
  pub sk_territorio:      i64,
  pub sk_status:          i64,
  /// The order's natural key, passed through unchanged.
  pub id_pedido_original: i64,
  pub qtd_venda:          Option<i64>,
  pub valor_unitario:     Option<f64>,
  pub desconto_unitario:  Option<f64>,
  pub valor_total_linha:  Option<f64>,
}

impl SalesFact {
  pub fn key(&self, kind: DimensionKind) -> i64 {
    match kind {
      DimensionKind::Product => self.sk_produto,
      DimensionKind::Customer => self.sk_cliente,
      DimensionKind::Time => self.sk_tempo,
      DimensionKind::Territory => self.sk_territorio,
      DimensionKind::Status => self.sk_status,
    }
  }
}

/// How an emitted fact batch is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactLoadMode {
  /// Append to whatever the table already holds. Re-running duplicates rows.
  #[default]
  Append,
  /// Truncate the table and append, in one transaction.
  Replace,
}

/// Counters from one [`resolve_sales_facts`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveStats {
  pub emitted:        usize,
  /// Detail rows dropped because no header carried their order id.
  pub orphan_details: usize,
  /// Per dimension, how many emitted rows received the sentinel key.
  pub misses:         BTreeMap<DimensionKind, usize>,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Parse an order date. Accepts a bare `YYYY-MM-DD` or one followed by a
/// time part, separated by a space or `T`.
pub fn parse_order_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Some(d);
  }
  ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|dt| dt.date())
    .or_else(|| {
      s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    })
}

struct HeaderKeys {
  customer:   Option<i64>,
  territory:  Option<i64>,
  status:     Option<i64>,
  order_date: Option<NaiveDate>,
}

fn expect_relation<'a>(
  relation: &'a StagedRelation,
  name: &str,
) -> Result<&'a StagedRelation> {
  if relation.name() == name {
    Ok(relation)
  } else {
    Err(Error::StagedRelationMissing(name.to_owned()))
  }
}

/// Join staged order details to their headers and resolve every surrogate key.
///
/// Details without a header are dropped. If a header id repeats, the first
/// header wins. Every other row is emitted, with unresolved keys set to
/// [`SENTINEL_KEY`]. The time key is the order date's `YYYYMMDD` encoding,
/// kept only if the time dimension holds it.
pub fn resolve_sales_facts(
  header: &StagedRelation,
  detail: &StagedRelation,
  keys: &DimensionKeys,
) -> Result<(Vec<SalesFact>, ResolveStats)> {
  let header = expect_relation(header, resource::SALES_ORDER_HEADER.name)?;
  let detail = expect_relation(detail, resource::SALES_ORDER_DETAIL.name)?;

  let h_order = header.require_column("salesorderid")?;
  let h_customer = header.column_index("customerid");
  let h_territory = header.column_index("territoryid");
  let h_status = header.column_index("status");
  let h_date = header.column_index("orderdate");

  let mut headers: HashMap<i64, HeaderKeys> = HashMap::new();
  for row in header.rows() {
    let Some(order_id) = row.integer(Some(h_order)) else {
      continue;
    };
    headers.entry(order_id).or_insert_with(|| HeaderKeys {
      customer:   row.integer(h_customer),
      territory:  row.integer(h_territory),
      status:     row.integer(h_status),
      order_date: row.text(h_date).and_then(parse_order_date),
    });
  }

  let d_order = detail.require_column("salesorderid")?;
  let d_product = detail.column_index("productid");
  let d_qty = detail.column_index("orderqty");
  let d_price = detail.column_index("unitprice");
  let d_discount = detail.column_index("unitpricediscount");
  let d_total = detail.column_index("linetotal");

  let mut stats = ResolveStats::default();
  let mut facts = Vec::with_capacity(detail.len());

  for row in detail.rows() {
    let joined = row
      .integer(Some(d_order))
      .and_then(|id| headers.get(&id).map(|h| (id, h)));
    let Some((order_id, h)) = joined else {
      stats.orphan_details += 1;
      continue;
    };

    let fact = SalesFact {
      sk_produto:         keys.resolve(DimensionKind::Product, row.integer(d_product)),
      sk_cliente:         keys.resolve(DimensionKind::Customer, h.customer),
      sk_tempo:           keys.resolve(DimensionKind::Time, h.order_date.map(date_key)),
      sk_territorio:      keys.resolve(DimensionKind::Territory, h.territory),
      sk_status:          keys.resolve(DimensionKind::Status, h.status),
      id_pedido_original: order_id,
      qtd_venda:          row.text(d_qty).and_then(parse_integer),
      valor_unitario:     row.decimal(d_price),
      desconto_unitario:  row.decimal(d_discount),
      valor_total_linha:  row.decimal(d_total),
    };

    for kind in [
      DimensionKind::Product,
      DimensionKind::Customer,
      DimensionKind::Time,
      DimensionKind::Territory,
      DimensionKind::Status,
    ] {
      if fact.key(kind) == SENTINEL_KEY {
        *stats.misses.entry(kind).or_default() += 1;
      }
    }

    facts.push(fact);
  }

  stats.emitted = facts.len();
  Ok((facts, stats))
}
