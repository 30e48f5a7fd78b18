//! SQL schema for the mart's SQLite store.
//!
//! Two logical namespaces share one database file: staging tables are named
//! `staging_<resource>` and hold every value as text; warehouse tables carry
//! the dimensional model. Dimension tables are created on each rebuild, so only
//! the fact table is part of the startup schema.

use mart_core::dimension::DimensionKind;

/// Startup DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Append-only unless a load runs in replace mode.
-- Key columns hold a dimension surrogate key or 0 for unknown.
CREATE TABLE IF NOT EXISTS fato_vendas (
    sk_produto          INTEGER NOT NULL DEFAULT 0,
    sk_cliente          INTEGER NOT NULL DEFAULT 0,
    sk_tempo            INTEGER NOT NULL DEFAULT 0,
    sk_territorio       INTEGER NOT NULL DEFAULT 0,
    sk_status           INTEGER NOT NULL DEFAULT 0,
    id_pedido_original  INTEGER NOT NULL,
    qtd_venda           INTEGER,
    valor_unitario      REAL,
    desconto_unitario   REAL,
    valor_total_linha   REAL
);

CREATE INDEX IF NOT EXISTS fato_vendas_pedido_idx ON fato_vendas(id_pedido_original);

PRAGMA user_version = 1;
";

/// `CREATE TABLE` for dimension `kind` under the name `table`.
///
/// The surrogate key is an `INTEGER PRIMARY KEY`, so on a freshly created
/// table SQLite assigns 1, 2, 3, … in insertion order. Time supplies its own.
pub fn dimension_ddl(kind: DimensionKind, table: &str) -> String {
  let columns = match kind {
    DimensionKind::Territory => {
      "id_territorio_original INTEGER NOT NULL,
       nome_territorio        TEXT,
       codigo_pais            TEXT,
       grupo                  TEXT,
       sk_territorio          INTEGER PRIMARY KEY"
    }
    DimensionKind::Status => {
      "id_status_original INTEGER NOT NULL,
       nome_status        TEXT    NOT NULL,
       flag_ativo         TEXT    NOT NULL CHECK (flag_ativo IN ('S', 'N')),
       sk_status          INTEGER PRIMARY KEY"
    }
    DimensionKind::Time => {
      "data_completa      TEXT    NOT NULL UNIQUE,   -- YYYY-MM-DD
       ano                INTEGER NOT NULL,
       mes                INTEGER NOT NULL,
       nome_mes           TEXT    NOT NULL,
       dia                INTEGER NOT NULL,
       trimestre          INTEGER NOT NULL,
       dia_da_semana      TEXT    NOT NULL,
       flag_fim_de_semana TEXT    NOT NULL CHECK (flag_fim_de_semana IN ('S', 'N')),
       sk_tempo           INTEGER PRIMARY KEY        -- YYYYMMDD"
    }
    DimensionKind::Product => {
      "id_produto_original INTEGER NOT NULL,
       nome_produto        TEXT,
       numero_produto      TEXT,
       cor                 TEXT NOT NULL,
       custo_padrao        REAL,
       preco_lista         REAL,
       sk_produto          INTEGER PRIMARY KEY"
    }
    DimensionKind::Customer => {
      "id_cliente_original INTEGER NOT NULL,
       nome_completo       TEXT NOT NULL,
       sk_cliente          INTEGER PRIMARY KEY"
    }
  };
  format!("CREATE TABLE {table} (\n       {columns}\n);")
}

/// Index on the natural-key column, created after the table is swapped in.
/// `None` for time, whose natural key is the primary key.
pub fn natural_key_index(kind: DimensionKind) -> Option<String> {
  let natural = kind.natural_key_column();
  if natural == kind.surrogate_key_column() {
    return None;
  }
  let table = kind.table_name();
  Some(format!(
    "CREATE INDEX IF NOT EXISTS {table}_natural_idx ON {table}({natural});"
  ))
}
