//! [`SqliteStore`]: the SQLite implementation of [`WarehouseStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, Transaction, params, params_from_iter};

use mart_core::{
  dimension::{DimensionKind, DimensionRows},
  fact::{FactLoadMode, KeyIndex, SalesFact},
  staging::StagedRelation,
  store::WarehouseStore,
};

use crate::{
  Result,
  encode::{
    FACT_COLUMNS, encode_date, encode_flag, fact_from_row, quote_ident,
    staging_table,
  },
  schema::{SCHEMA, dimension_ddl, natural_key_index},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A sales mart backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Whether a table named `table` exists.
  async fn table_exists(&self, table: String) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| Ok(table_exists(conn, &table)?))
      .await?;
    Ok(exists)
  }
}

fn table_exists(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Insert `rows` into the (freshly created) table `table`.
fn insert_dimension_rows(
  tx: &Transaction<'_>,
  table: &str,
  rows: &DimensionRows,
) -> rusqlite::Result<usize> {
  let mut written = 0;

  match rows {
    DimensionRows::Territory(rows) => {
      let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} (id_territorio_original, nome_territorio, codigo_pais, grupo)
         VALUES (?1, ?2, ?3, ?4)"
      ))?;
      for r in rows {
        written += stmt.execute(params![
          r.id_territorio_original,
          r.nome_territorio,
          r.codigo_pais,
          r.grupo,
        ])?;
      }
    }
    DimensionRows::Status(rows) => {
      let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} (id_status_original, nome_status, flag_ativo)
         VALUES (?1, ?2, ?3)"
      ))?;
      for r in rows {
        written += stmt.execute(params![
          r.id_status_original,
          r.nome_status,
          encode_flag(r.flag_ativo),
        ])?;
      }
    }
    DimensionRows::Time(rows) => {
      let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} (
           data_completa, ano, mes, nome_mes, dia, trimestre,
           dia_da_semana, flag_fim_de_semana, sk_tempo
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
      ))?;
      for r in rows {
        written += stmt.execute(params![
          encode_date(r.data_completa),
          r.ano,
          r.mes,
          r.nome_mes,
          r.dia,
          r.trimestre,
          r.dia_da_semana,
          encode_flag(r.flag_fim_de_semana),
          r.sk_tempo,
        ])?;
      }
    }
    DimensionRows::Product(rows) => {
      let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} (
           id_produto_original, nome_produto, numero_produto, cor,
           custo_padrao, preco_lista
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
      ))?;
      for r in rows {
        written += stmt.execute(params![
          r.id_produto_original,
          r.nome_produto,
          r.numero_produto,
          r.cor,
          r.custo_padrao,
          r.preco_lista,
        ])?;
      }
    }
    DimensionRows::Customer(rows) => {
      let mut stmt = tx.prepare(&format!(
        "INSERT INTO {table} (id_cliente_original, nome_completo) VALUES (?1, ?2)"
      ))?;
      for r in rows {
        written +=
          stmt.execute(params![r.id_cliente_original, r.nome_completo])?;
      }
    }
  }

  Ok(written)
}

// ─── WarehouseStore impl ─────────────────────────────────────────────────────

impl WarehouseStore for SqliteStore {
  type Error = crate::Error;

  // ── Staging ───────────────────────────────────────────────────────────────

  async fn replace_staged(&self, relation: StagedRelation) -> Result<usize> {
    let table = staging_table(relation.name())?;

    let written = self
      .conn
      .call(move |conn| {
        let side = format!("{table}__next");
        let columns: Vec<String> =
          relation.columns().iter().map(|c| quote_ident(c)).collect();
        let ddl_columns = columns
          .iter()
          .map(|c| format!("{c} TEXT"))
          .collect::<Vec<_>>()
          .join(", ");
        let placeholders = (1..=columns.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");

        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
          "DROP TABLE IF EXISTS {side};
           CREATE TABLE {side} ({ddl_columns});"
        ))?;

        let mut written = 0;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO {side} ({}) VALUES ({placeholders})",
            columns.join(", ")
          ))?;
          for row in relation.raw_rows() {
            written += stmt.execute(params_from_iter(row.iter()))?;
          }
        }

        tx.execute_batch(&format!(
          "DROP TABLE IF EXISTS {table};
           ALTER TABLE {side} RENAME TO {table};"
        ))?;
        tx.commit()?;
        Ok(written)
      })
      .await?;

    Ok(written)
  }

  async fn staged(&self, name: &str) -> Result<Option<StagedRelation>> {
    let table = staging_table(name)?;
    let name = name.to_owned();

    let relation = self
      .conn
      .call(move |conn| {
        if !table_exists(conn, &table)? {
          return Ok(None);
        }

        let mut stmt = conn.prepare(&format!("SELECT * FROM {table} ORDER BY rowid"))?;
        let columns: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();
        let width = columns.len();

        let rows = stmt
          .query_map([], |row| {
            (0..width)
              .map(|i| row.get::<_, Option<String>>(i))
              .collect::<rusqlite::Result<Vec<_>>>()
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(StagedRelation::new(name, columns, rows)))
      })
      .await?;

    Ok(relation)
  }

  // ── Dimensions ────────────────────────────────────────────────────────────

  async fn replace_dimension(&self, rows: DimensionRows) -> Result<usize> {
    let kind = rows.kind();

    // Build the new table off to the side, then swap it in. Everything runs in
    // one transaction, so a failure leaves the live table untouched.
    let written = self
      .conn
      .call(move |conn| {
        let table = kind.table_name();
        let side = format!("{table}__next");

        let tx = conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {side};"))?;
        tx.execute_batch(&dimension_ddl(kind, &side))?;
        let written = insert_dimension_rows(&tx, &side, &rows)?;
        tx.execute_batch(&format!(
          "DROP TABLE IF EXISTS {table};
           ALTER TABLE {side} RENAME TO {table};"
        ))?;
        if let Some(index) = natural_key_index(kind) {
          tx.execute_batch(&index)?;
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    tracing::debug!(dimension = %kind, rows = written, "dimension swapped in");
    Ok(written)
  }

  async fn dimension_keys(&self, kind: DimensionKind) -> Result<Option<KeyIndex>> {
    let pairs: Option<Vec<(i64, i64)>> = self
      .conn
      .call(move |conn| {
        let table = kind.table_name();
        if !table_exists(conn, table)? {
          return Ok(None);
        }
        let mut stmt = conn.prepare(&format!(
          "SELECT {}, {} FROM {table}",
          kind.natural_key_column(),
          kind.surrogate_key_column(),
        ))?;
        let pairs = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(pairs))
      })
      .await?;

    Ok(pairs.map(KeyIndex::from_pairs))
  }

  async fn dimension_len(&self, kind: DimensionKind) -> Result<Option<usize>> {
    if !self.table_exists(kind.table_name().to_owned()).await? {
      return Ok(None);
    }

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!("SELECT COUNT(*) FROM {}", kind.table_name()),
          [],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(Some(count as usize))
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn load_facts(
    &self,
    facts: Vec<SalesFact>,
    mode: FactLoadMode,
  ) -> Result<usize> {
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if mode == FactLoadMode::Replace {
          tx.execute("DELETE FROM fato_vendas", [])?;
        }

        let mut written = 0;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO fato_vendas ({FACT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
          ))?;
          for f in &facts {
            written += stmt.execute(params![
              f.sk_produto,
              f.sk_cliente,
              f.sk_tempo,
              f.sk_territorio,
              f.sk_status,
              f.id_pedido_original,
              f.qtd_venda,
              f.valor_unitario,
              f.desconto_unitario,
              f.valor_total_linha,
            ])?;
          }
        }

        tx.commit()?;
        Ok(written)
      })
      .await?;

    Ok(written)
  }

  async fn facts(&self) -> Result<Vec<SalesFact>> {
    let facts = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FACT_COLUMNS} FROM fato_vendas ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map([], fact_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(facts)
  }
}
