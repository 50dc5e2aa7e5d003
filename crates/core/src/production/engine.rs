//! Run/stoppage transitions.
//!
//! Each operation locks the machine, reads its open records, decides, writes,
//! recomputes the machine status from what is left open, and commits. No state
//! is kept between calls.

use serde::Serialize;

use crate::category::{CategoryCatalog, StoppageCategory};
use crate::error::CoreError;
use crate::production::state::MachineState;
use crate::production::store::{
    MachineTx, NewRun, NewStoppage, OpenRun, OpenStoppage, ProductionStore, RunClosure,
    StoppageClosure,
};
use crate::production::timing::{elapsed_seconds, run_metrics};
use crate::session::SessionContext;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTransition {
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppageTransition {
    Opened,
    Closed,
}

/// Result of [`ProductionEngine::toggle_run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub transition: RunTransition,
    pub run_id: DbId,
    pub state: MachineState,
    pub status_label: String,
    /// Set when the run was closed.
    pub total_seconds: Option<i64>,
    pub average_cycle_seconds: Option<f64>,
}

/// Result of [`ProductionEngine::toggle_stoppage`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoppageOutcome {
    pub transition: StoppageTransition,
    pub stoppage_id: DbId,
    pub category: StoppageCategory,
    /// Run that was open when the stoppage began, if any.
    pub run_id: Option<DbId>,
    pub state: MachineState,
    pub status_label: String,
    pub total_seconds: Option<i64>,
}

/// Open records of one machine, read under its lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineSnapshot {
    pub state: MachineState,
    pub status_label: String,
    pub open_run: Option<OpenRun>,
    pub open_stoppages: Vec<OpenStoppage>,
}

/// Stateless decision layer over a [`ProductionStore`].
#[derive(Debug, Clone)]
pub struct ProductionEngine<S> {
    store: S,
    catalog: CategoryCatalog,
}

impl<S: ProductionStore> ProductionEngine<S> {
    pub fn new(store: S, catalog: CategoryCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Start a run if none is open on the machine, otherwise close the open one.
    pub async fn toggle_run(
        &self,
        session: &SessionContext,
        machine_id: &str,
        now: Timestamp,
    ) -> Result<RunOutcome, S::Error> {
        let operator = session.require_operator()?;
        let mut tx = self.store.lock_machine(machine_id).await?;

        let (transition, run_id, metrics) = match tx.find_open_run().await? {
            None => {
                let run_id = tx
                    .insert_run(NewRun {
                        started_at: now,
                        start_operator: operator.matricula.clone(),
                    })
                    .await?;
                (RunTransition::Started, run_id, None)
            }
            Some(open) => {
                let metrics = run_metrics(open.started_at, now, open.cycle_count)?;
                tx.close_run(
                    open.id,
                    RunClosure {
                        ended_at: now,
                        end_operator: operator.matricula.clone(),
                        total_seconds: metrics.total_seconds,
                        average_cycle_seconds: metrics.average_cycle_seconds,
                    },
                )
                .await?;
                (RunTransition::Stopped, open.id, Some(metrics))
            }
        };

        let state = refresh_status(&mut tx, &self.catalog).await?;
        tx.commit().await?;

        Ok(RunOutcome {
            transition,
            run_id,
            status_label: state.label(),
            state,
            total_seconds: metrics.map(|m| m.total_seconds),
            average_cycle_seconds: metrics.and_then(|m| m.average_cycle_seconds),
        })
    }

    /// Open a stoppage of `category` if none of that category is open on the
    /// machine, otherwise close it. Other categories are left untouched.
    ///
    /// Only catalog categories can be opened. An open stoppage whose label is
    /// no longer in the catalog (imported history, a category removed from
    /// the configuration) can still be closed by naming it.
    pub async fn toggle_stoppage(
        &self,
        session: &SessionContext,
        machine_id: &str,
        category: &str,
        now: Timestamp,
    ) -> Result<StoppageOutcome, S::Error> {
        let operator = session.require_operator()?;
        if category.trim().is_empty() {
            return Err(
                CoreError::Validation("Stoppage category must not be empty".into()).into(),
            );
        }
        let mut tx = self.store.lock_machine(machine_id).await?;
        let category = match self.catalog.parse(category) {
            Ok(known) => known,
            Err(unknown) => find_open_uncatalogued(&mut tx, category)
                .await?
                .ok_or(unknown)?,
        };

        let (transition, stoppage_id, run_id, total_seconds) =
            match tx.find_open_stoppage(&category).await? {
                None => {
                    let run_id = tx.find_open_run_id().await?;
                    let stoppage_id = tx
                        .insert_stoppage(NewStoppage {
                            run_id,
                            category: category.clone(),
                            started_at: now,
                            start_operator: operator.matricula.clone(),
                        })
                        .await?;
                    (StoppageTransition::Opened, stoppage_id, run_id, None)
                }
                Some(open) => {
                    let total_seconds = elapsed_seconds(open.started_at, now)?;
                    tx.close_stoppage(
                        open.id,
                        StoppageClosure {
                            ended_at: now,
                            end_operator: operator.matricula.clone(),
                            total_seconds,
                        },
                    )
                    .await?;
                    (
                        StoppageTransition::Closed,
                        open.id,
                        open.run_id,
                        Some(total_seconds),
                    )
                }
            };

        let state = refresh_status(&mut tx, &self.catalog).await?;
        tx.commit().await?;

        Ok(StoppageOutcome {
            transition,
            stoppage_id,
            category,
            run_id,
            status_label: state.label(),
            state,
            total_seconds,
        })
    }

    /// Record the cycle count of the machine's open run.
    ///
    /// The count feeds the average cycle time computed when the run closes.
    pub async fn record_cycles(
        &self,
        session: &SessionContext,
        machine_id: &str,
        cycles: i32,
    ) -> Result<DbId, S::Error> {
        session.require_operator()?;
        if cycles < 0 {
            return Err(CoreError::Validation("Cycle count must not be negative".into()).into());
        }
        let mut tx = self.store.lock_machine(machine_id).await?;
        let run_id = tx
            .find_open_run_id()
            .await?
            .ok_or_else(|| CoreError::not_found("Open run for machine", machine_id))?;
        tx.set_cycle_count(run_id, cycles).await?;
        tx.commit().await?;
        Ok(run_id)
    }

    /// Recompute and persist the status label from the machine's open records.
    ///
    /// Needed after rows are written outside the engine, e.g. by an import.
    pub async fn resync_status(&self, machine_id: &str) -> Result<MachineState, S::Error> {
        let mut tx = self.store.lock_machine(machine_id).await?;
        let state = refresh_status(&mut tx, &self.catalog).await?;
        tx.commit().await?;
        Ok(state)
    }

    /// Read the machine's open records and derived state.
    pub async fn snapshot(&self, machine_id: &str) -> Result<MachineSnapshot, S::Error> {
        let mut tx = self.store.lock_machine(machine_id).await?;
        let open_run = tx.find_open_run().await?;
        let open_stoppages = tx.list_open_stoppages().await?;
        tx.commit().await?;

        let state = MachineState::derive(
            open_run.is_some(),
            open_stoppages.iter().map(|s| s.category.clone()),
            &self.catalog,
        );
        Ok(MachineSnapshot {
            status_label: state.label(),
            state,
            open_run,
            open_stoppages,
        })
    }
}

/// Open stoppage on the locked machine whose stored label matches `raw`
/// (trimmed, case-insensitive).
async fn find_open_uncatalogued<T: MachineTx>(
    tx: &mut T,
    raw: &str,
) -> Result<Option<StoppageCategory>, T::Error> {
    let wanted = raw.trim().to_lowercase();
    Ok(tx
        .list_open_stoppages()
        .await?
        .into_iter()
        .map(|s| s.category)
        .find(|c| c.as_str().to_lowercase() == wanted))
}

/// Recompute the machine state from what is open inside `tx` and persist its
/// label.
async fn refresh_status<T: MachineTx>(
    tx: &mut T,
    catalog: &CategoryCatalog,
) -> Result<MachineState, T::Error> {
    let run_open = tx.find_open_run_id().await?.is_some();
    let open = tx.list_open_stoppages().await?;
    let state = MachineState::derive(run_open, open.into_iter().map(|s| s.category), catalog);
    tx.update_machine_status(&state.label()).await?;
    Ok(state)
}
