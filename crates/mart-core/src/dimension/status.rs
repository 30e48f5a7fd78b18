//! The order-status dimension: a literal catalog regenerated identically on
//! every build. The source system has no queryable status reference.

use crate::dimension::StatusRow;

/// `(id_status_original, nome_status, flag_ativo)` for every known status.
pub const STATUS_CATALOG: [(i64, &str, bool); 5] = [
  (1, "Em Processamento", false),
  (2, "Aprovado", true),
  (3, "Em Espera", false),
  (4, "Rejeitado", false),
  (5, "Enviado", true),
];

pub(super) fn rows() -> Vec<StatusRow> {
  STATUS_CATALOG
    .iter()
    .map(|&(id, name, active)| StatusRow {
      id_status_original: id,
      nome_status:        name.to_owned(),
      flag_ativo:         active,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalog_is_stable_across_builds() {
    assert_eq!(rows(), rows());
    let ids: Vec<i64> = rows().iter().map(|r| r.id_status_original).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
  }

  #[test]
  fn approved_and_shipped_are_active() {
    let active: Vec<String> = rows()
      .into_iter()
      .filter(|r| r.flag_ativo)
      .map(|r| r.nome_status)
      .collect();
    assert_eq!(active, vec!["Aprovado", "Enviado"]);
  }
}
