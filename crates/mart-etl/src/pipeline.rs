//! Build orchestration.
//!
//! A run rebuilds the five dimensions concurrently, waits for every one of
//! them to reach a terminal state, then runs the fact unit subject to the
//! configured [`TriggerRule`]. Every unit runs under the [`RetryPolicy`].
//! Units communicate only through the store.

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;
use mart_core::{
  dimension::{CalendarRange, DimensionKind},
  fact::ResolveStats,
  store::WarehouseStore,
};
use serde::Serialize;
use strum::IntoEnumIterator as _;
use tokio::task::JoinSet;
use tracing::Instrument as _;
use uuid::Uuid;

use crate::{
  Result,
  config::{PipelineConfig, TriggerRule},
  retry::Attempted,
  units,
};

/// Terminal state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UnitOutcome {
  Succeeded { attempts: u32, rows: usize },
  Failed { attempts: u32, error: String },
  /// Never started because its trigger rule was not met.
  Blocked,
}

impl UnitOutcome {
  pub fn is_success(&self) -> bool { matches!(self, Self::Succeeded { .. }) }

  fn from_attempt<T>(
    attempted: &Attempted<T, crate::Error>,
    rows: impl FnOnce(&T) -> usize,
  ) -> Self {
    match &attempted.result {
      Ok(value) => Self::Succeeded {
        attempts: attempted.attempts,
        rows:     rows(value),
      },
      Err(err) => Self::Failed {
        attempts: attempted.attempts,
        error:    err.to_string(),
      },
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub run_id:     Uuid,
  pub as_of:      NaiveDate,
  pub dimensions:     BTreeMap<DimensionKind, UnitOutcome>,
  /// Stored row count of each dimension once every dimension unit finished.
  /// A failed unit leaves the previous table, so this is what the fact unit
  /// resolved against. `None` when the table has never been built.
  pub dimension_rows: BTreeMap<DimensionKind, Option<usize>>,
  pub fact:           UnitOutcome,
  /// Present when the fact unit succeeded.
  pub fact_stats:     Option<ResolveStats>,
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.fact.is_success() && self.dimensions.values().all(UnitOutcome::is_success)
  }
}

pub struct Pipeline<S> {
  store:  Arc<S>,
  config: PipelineConfig,
}

impl<S: WarehouseStore + 'static> Pipeline<S> {
  pub fn new(store: Arc<S>, config: PipelineConfig) -> Self { Self { store, config } }

  /// Run a build whose time dimension ends today, in local time.
  pub async fn run(&self, run_id: Uuid) -> Result<RunReport> {
    self.run_as_of(run_id, chrono::Local::now().date_naive()).await
  }

  /// Run a build whose time dimension ends on `as_of`.
  ///
  /// Unit failures are reported in the [`RunReport`]. An error is returned
  /// only when the run cannot be set up or a unit task panics.
  pub async fn run_as_of(&self, run_id: Uuid, as_of: NaiveDate) -> Result<RunReport> {
    let span = tracing::info_span!("run", %run_id);
    let calendar = CalendarRange::new(self.config.time_epoch, as_of)?;
    span.in_scope(|| {
      tracing::debug!(epoch = %self.config.time_epoch, %as_of, days = calendar.days(), "calendar");
    });

    let dimensions = self.run_dimensions(calendar).instrument(span.clone()).await?;
    let dimension_rows = self.dimension_rows().instrument(span.clone()).await;

    let fact_allowed = match self.config.trigger {
      TriggerRule::AllDone => true,
      TriggerRule::AllSuccess => dimensions.values().all(UnitOutcome::is_success),
    };

    let (fact, fact_stats) = if fact_allowed {
      self.run_fact().instrument(span.clone()).await
    } else {
      span.in_scope(|| {
        tracing::warn!(trigger = %self.config.trigger, "fact unit blocked by failed dimension");
      });
      (UnitOutcome::Blocked, None)
    };

    let report = RunReport {
      run_id,
      as_of,
      dimensions,
      dimension_rows,
      fact,
      fact_stats,
    };
    span.in_scope(|| {
      tracing::info!(success = report.is_success(), "run finished");
    });
    Ok(report)
  }

  /// Fan out one task per dimension and wait for all of them.
  async fn run_dimensions(
    &self,
    calendar: CalendarRange,
  ) -> Result<BTreeMap<DimensionKind, UnitOutcome>> {
    let mut set = JoinSet::new();
    for kind in DimensionKind::iter() {
      let store = Arc::clone(&self.store);
      let policy = self.config.retry;
      set.spawn(
        async move {
          let name = format!("dimension:{kind}");
          let attempted = policy
            .run(&name, |_| units::dimension_unit(store.as_ref(), kind, calendar))
            .await;
          (kind, UnitOutcome::from_attempt(&attempted, |rows| *rows))
        }
        .in_current_span(),
      );
    }

    let mut outcomes = BTreeMap::new();
    while let Some(joined) = set.join_next().await {
      let (kind, outcome) = joined?;
      outcomes.insert(kind, outcome);
    }
    Ok(outcomes)
  }

  /// Count the rows of every dimension table. A failed count is logged and
  /// reported as `None`.
  async fn dimension_rows(&self) -> BTreeMap<DimensionKind, Option<usize>> {
    let mut rows = BTreeMap::new();
    for kind in DimensionKind::iter() {
      let len = match self.store.dimension_len(kind).await {
        Ok(len) => len,
        Err(err) => {
          tracing::warn!(dimension = %kind, error = %err, "could not count dimension rows");
          None
        }
      };
      rows.insert(kind, len);
    }
    rows
  }

  async fn run_fact(&self) -> (UnitOutcome, Option<ResolveStats>) {
    let store = self.store.as_ref();
    let mode = self.config.fact_load;
    let attempted = self
      .config
      .retry
      .run("fact", |_| units::fact_unit(store, mode))
      .await;

    let outcome = UnitOutcome::from_attempt(&attempted, |stats| stats.emitted);
    (outcome, attempted.result.ok())
  }
}
