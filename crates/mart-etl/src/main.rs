//! `mart` command-line entry point.
//!
//! Reads `mart.toml` (or the path given with `--config`), layered with
//! `MART_*` environment variables, and opens the SQLite store it names.
//!
//! ```text
//! mart stage [RESOURCE...]   # acquire and stage source resources
//! mart build [--run-id ID]   # rebuild the dimensions, then load facts
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use mart_etl::{
  acquire::{Acquirer, HttpFetcher},
  config::MartConfig,
  pipeline::Pipeline,
  stage,
};
use mart_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Sales data mart ETL")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "mart.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Fetch source resources and replace their staged relations.
  Stage {
    /// Resources to stage, by name (e.g. `customer`). Defaults to all.
    resources: Vec<String>,
  },
  /// Rebuild the dimensions, then resolve and load the fact rows.
  Build {
    /// Identity of this run; generated when absent.
    #[arg(long)]
    run_id: Option<Uuid>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = load_config(cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Stage { resources } => {
      let resources = stage::select(&resources)?;
      let fetcher = HttpFetcher::new(&cfg.source_base_url)
        .context("failed to build HTTP fetcher")?;
      let acquirer = Acquirer::new(fetcher, &cfg.cache_dir);
      let report = stage::stage(&acquirer, &store, &resources)
        .await
        .context("staging failed")?;

      println!("{}", serde_json::to_string_pretty(&report)?);
      tracing::info!(
        staged = report.staged_count(),
        total = report.resources.len(),
        "staging finished"
      );
    }
    Command::Build { run_id } => {
      let run_id = run_id.unwrap_or_else(Uuid::new_v4);
      let pipeline = Pipeline::new(Arc::new(store), cfg.pipeline);
      let report = pipeline.run(run_id).await.context("build failed")?;

      println!("{}", serde_json::to_string_pretty(&report)?);
      if !report.is_success() {
        anyhow::bail!("run {run_id} finished with failed or blocked units");
      }
    }
  }

  Ok(())
}

fn load_config(path: PathBuf) -> anyhow::Result<MartConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("MART")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let cfg: MartConfig = settings
    .try_deserialize()
    .context("failed to deserialise MartConfig")?;

  Ok(cfg.expand_paths())
}
