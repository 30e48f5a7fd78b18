//! Dimensions projected from staged relations: territory, product, customer.
//!
//! Each builder copies a fixed subset of staged columns into dimension
//! attributes. The natural-key column must exist in the schema; rows whose
//! natural key is null or non-numeric are dropped. Any other column missing
//! from the schema simply reads as null.

use crate::{
  Result,
  dimension::{CustomerRow, ProductRow, TerritoryRow},
  staging::{StagedRelation, StagedRow},
};

/// Colour recorded for products without one.
pub const NOT_APPLICABLE: &str = "N/A";

/// Name recorded for customers with neither a person nor a company name.
pub const FINAL_CONSUMER: &str = "Consumidor Final";

/// Rows of `relation` with a usable natural key at `key_idx`, paired with it.
fn keyed_rows(
  relation: &StagedRelation,
  key_idx: usize,
) -> impl Iterator<Item = (i64, StagedRow<'_>)> + '_ {
  relation
    .rows()
    .filter_map(move |row| row.integer(Some(key_idx)).map(|k| (k, row)))
}

fn log_dropped(relation: &StagedRelation, kept: usize) {
  let dropped = relation.len() - kept;
  if dropped > 0 {
    tracing::debug!(
      relation = relation.name(),
      dropped,
      "dropped rows without a usable natural key"
    );
  }
}

pub(super) fn territory(relation: &StagedRelation) -> Result<Vec<TerritoryRow>> {
  let id = relation.require_column("territoryid")?;
  let name = relation.column_index("name");
  let country = relation.column_index("countryregioncode");
  let group = relation.column_index("group");

  let rows: Vec<TerritoryRow> = keyed_rows(relation, id)
    .map(|(key, row)| TerritoryRow {
      id_territorio_original: key,
      nome_territorio:        row.text(name).map(str::to_owned),
      codigo_pais:            row.text(country).map(str::to_owned),
      grupo:                  row.text(group).map(str::to_owned),
    })
    .collect();
  log_dropped(relation, rows.len());
  Ok(rows)
}

pub(super) fn product(relation: &StagedRelation) -> Result<Vec<ProductRow>> {
  let id = relation.require_column("productid")?;
  let name = relation.column_index("name");
  let number = relation.column_index("productnumber");
  let color = relation.column_index("color");
  let cost = relation.column_index("standardcost");
  let price = relation.column_index("listprice");

  let rows: Vec<ProductRow> = keyed_rows(relation, id)
    .map(|(key, row)| ProductRow {
      id_produto_original: key,
      nome_produto:        row.text(name).map(str::to_owned),
      numero_produto:      row.text(number).map(str::to_owned),
      cor:                 row
        .non_blank(color)
        .unwrap_or(NOT_APPLICABLE)
        .to_owned(),
      custo_padrao:        row.decimal(cost),
      preco_lista:         row.decimal(price),
    })
    .collect();
  log_dropped(relation, rows.len());
  Ok(rows)
}

pub(super) fn customer(relation: &StagedRelation) -> Result<Vec<CustomerRow>> {
  let id = relation.require_column("customerid")?;
  let first = relation.column_index("firstname");
  let last = relation.column_index("lastname");
  let company = relation.column_index("companyname");

  let rows: Vec<CustomerRow> = keyed_rows(relation, id)
    .map(|(key, row)| {
      let nome_completo = match (row.non_blank(first), row.non_blank(last)) {
        (Some(f), Some(l)) => format!("{f} {l}"),
        _ => row
          .non_blank(company)
          .unwrap_or(FINAL_CONSUMER)
          .to_owned(),
      };
      CustomerRow { id_cliente_original: key, nome_completo }
    })
    .collect();
  log_dropped(relation, rows.len());
  Ok(rows)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    Error,
    resource::{CUSTOMER, PRODUCT, TERRITORY},
  };

  /// A relation with `columns` where only the named cells are set.
  fn relation(
    name: &str,
    columns: Vec<String>,
    rows: &[&[(&str, &str)]],
  ) -> StagedRelation {
    let raw = rows
      .iter()
      .map(|cells| {
        columns
          .iter()
          .map(|c| {
            cells
              .iter()
              .find(|(k, _)| *k == c.as_str())
              .map(|(_, v)| (*v).to_owned())
          })
          .collect()
      })
      .collect();
    StagedRelation::new(name, columns, raw)
  }

  #[test]
  fn product_color_defaults_to_not_applicable() {
    let rel = relation("product", PRODUCT.staged_columns(), &[&[
      ("productid", "680"),
      ("name", "HL Road Frame"),
      ("productnumber", "FR-R92B-58"),
      ("standardcost", "1059.31"),
      ("listprice", "1431.50"),
    ]]);
    let rows = product(&rel).unwrap();
    assert_eq!(rows.len(), 1);
    let p = &rows[0];
    assert_eq!(p.id_produto_original, 680);
    assert_eq!(p.nome_produto.as_deref(), Some("HL Road Frame"));
    assert_eq!(p.cor, NOT_APPLICABLE);
    assert_eq!(p.custo_padrao, Some(1059.31));
    assert_eq!(p.preco_lista, Some(1431.50));
  }

  #[test]
  fn product_keeps_existing_color() {
    let rel = relation("product", PRODUCT.staged_columns(), &[&[
      ("productid", "706"),
      ("color", "Red"),
    ]]);
    assert_eq!(product(&rel).unwrap()[0].cor, "Red");
  }

  #[test]
  fn customer_person_name_wins() {
    let rel = relation("customer", CUSTOMER.staged_columns(), &[&[
      ("customerid", "1"),
      ("firstname", "Orlando"),
      ("lastname", "Gee"),
      ("companyname", "A Bike Store"),
    ]]);
    assert_eq!(customer(&rel).unwrap()[0].nome_completo, "Orlando Gee");
  }

  #[test]
  fn customer_falls_back_to_company_without_name_columns() {
    let rel = relation(
      "customer",
      vec!["customerid".into(), "companyname".into()],
      &[
        &[("customerid", "2"), ("companyname", "Bike World")],
        &[("customerid", "3")],
      ],
    );
    let rows = customer(&rel).unwrap();
    assert_eq!(rows[0].nome_completo, "Bike World");
    assert_eq!(rows[1].nome_completo, FINAL_CONSUMER);
  }

  #[test]
  fn customer_with_partial_name_uses_company() {
    let rel = relation("customer", CUSTOMER.staged_columns(), &[&[
      ("customerid", "4"),
      ("firstname", "Keith"),
      ("companyname", "Bike World"),
    ]]);
    assert_eq!(customer(&rel).unwrap()[0].nome_completo, "Bike World");
  }

  #[test]
  fn territory_projects_columns() {
    let rel = relation("territory", TERRITORY.staged_columns(), &[&[
      ("territoryid", "1"),
      ("name", "Northwest"),
      ("countryregioncode", "US"),
      ("group", "North America"),
    ]]);
    let t = &territory(&rel).unwrap()[0];
    assert_eq!(t.id_territorio_original, 1);
    assert_eq!(t.nome_territorio.as_deref(), Some("Northwest"));
    assert_eq!(t.codigo_pais.as_deref(), Some("US"));
    assert_eq!(t.grupo.as_deref(), Some("North America"));
  }

  #[test]
  fn rows_without_natural_key_are_dropped() {
    let rel = relation("territory", TERRITORY.staged_columns(), &[
      &[("territoryid", "1")],
      &[("territoryid", "not-a-number")],
      &[("name", "Nowhere")],
    ]);
    assert_eq!(territory(&rel).unwrap().len(), 1);
  }

  #[test]
  fn missing_natural_key_column_is_an_error() {
    let rel = relation("territory", vec!["name".into()], &[]);
    assert!(matches!(
      territory(&rel),
      Err(Error::MissingColumn { column, .. }) if column == "territoryid"
    ));
  }
}
