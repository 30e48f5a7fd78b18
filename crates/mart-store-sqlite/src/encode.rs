//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text. Boolean flags use the warehouse's
//! `S`/`N` convention. Staging tables are all text.

use chrono::NaiveDate;
use mart_core::fact::SalesFact;

use crate::{Error, Result};

// ─── Flags ───────────────────────────────────────────────────────────────────

pub fn encode_flag(flag: bool) -> &'static str {
  if flag { "S" } else { "N" }
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

/// Table holding the staged relation `name`.
pub fn staging_table(name: &str) -> Result<String> {
  let valid = !name.is_empty()
    && name
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
  if valid {
    Ok(format!("staging_{name}"))
  } else {
    Err(Error::InvalidRelationName(name.to_owned()))
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list of `fato_vendas`, in the order [`fact_from_row`] reads it.
pub const FACT_COLUMNS: &str = "sk_produto, sk_cliente, sk_tempo, sk_territorio, \
                                sk_status, id_pedido_original, qtd_venda, \
                                valor_unitario, desconto_unitario, \
                                valor_total_linha";

pub fn fact_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SalesFact> {
  Ok(SalesFact {
    sk_produto:         row.get(0)?,
    sk_cliente:         row.get(1)?,
    sk_tempo:           row.get(2)?,
    sk_territorio:      row.get(3)?,
    sk_status:          row.get(4)?,
    id_pedido_original: row.get(5)?,
    qtd_venda:          row.get(6)?,
    valor_unitario:     row.get(7)?,
    desconto_unitario:  row.get(8)?,
    valor_total_linha:  row.get(9)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn staging_table_names() {
    assert_eq!(staging_table("product").unwrap(), "staging_product");
    assert!(staging_table("").is_err());
    assert!(staging_table("x; DROP TABLE y").is_err());
    assert!(staging_table("Product").is_err());
  }

  #[test]
  fn quoting_doubles_quotes() {
    assert_eq!(quote_ident("group"), "\"group\"");
    assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
  }

  #[test]
  fn dates_and_flags() {
    let d = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
    assert_eq!(encode_date(d), "2010-01-01");
    assert_eq!(encode_flag(true), "S");
    assert_eq!(encode_flag(false), "N");
  }
}
