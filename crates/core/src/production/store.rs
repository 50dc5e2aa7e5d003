//! Storage contract consumed by the production engine.
//!
//! Every transition runs inside a [`MachineTx`]: a unit of work that holds an
//! exclusive lock on one machine from the first read until `commit`. Dropping
//! a transaction without committing discards its writes.

use std::future::Future;

use serde::Serialize;

use crate::category::StoppageCategory;
use crate::error::CoreError;
use crate::types::{DbId, MachineId, Matricula, Timestamp};

// ---------------------------------------------------------------------------
// Records exchanged with the store
// ---------------------------------------------------------------------------

/// The run currently open on a machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenRun {
    pub id: DbId,
    pub machine_id: MachineId,
    pub started_at: Timestamp,
    pub start_operator: Matricula,
    pub cycle_count: Option<i32>,
}

/// A stoppage currently open on a machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenStoppage {
    pub id: DbId,
    pub machine_id: MachineId,
    pub run_id: Option<DbId>,
    pub category: StoppageCategory,
    pub started_at: Timestamp,
    pub start_operator: Matricula,
}

#[derive(Debug, Clone)]
pub struct NewRun {
    pub started_at: Timestamp,
    pub start_operator: Matricula,
}

#[derive(Debug, Clone)]
pub struct RunClosure {
    pub ended_at: Timestamp,
    pub end_operator: Matricula,
    pub total_seconds: i64,
    pub average_cycle_seconds: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewStoppage {
    pub run_id: Option<DbId>,
    pub category: StoppageCategory,
    pub started_at: Timestamp,
    pub start_operator: Matricula,
}

#[derive(Debug, Clone)]
pub struct StoppageClosure {
    pub ended_at: Timestamp,
    pub end_operator: Matricula,
    pub total_seconds: i64,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A store able to open machine-scoped transactions.
pub trait ProductionStore: Send + Sync {
    type Error: From<CoreError> + Send;
    type Tx: MachineTx<Error = Self::Error>;

    /// Begin a transaction holding the exclusive lock on `machine_id`.
    ///
    /// Fails with `NotFound` when the machine does not exist.
    fn lock_machine(
        &self,
        machine_id: &str,
    ) -> impl Future<Output = Result<Self::Tx, Self::Error>> + Send;
}

/// Reads and writes on one locked machine.
pub trait MachineTx: Send {
    type Error: From<CoreError> + Send;

    fn find_open_run(
        &mut self,
    ) -> impl Future<Output = Result<Option<OpenRun>, Self::Error>> + Send;

    fn find_open_run_id(
        &mut self,
    ) -> impl Future<Output = Result<Option<DbId>, Self::Error>> + Send {
        async move { Ok(self.find_open_run().await?.map(|run| run.id)) }
    }

    fn insert_run(
        &mut self,
        run: NewRun,
    ) -> impl Future<Output = Result<DbId, Self::Error>> + Send;

    fn close_run(
        &mut self,
        run_id: DbId,
        closure: RunClosure,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn set_cycle_count(
        &mut self,
        run_id: DbId,
        cycles: i32,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn find_open_stoppage(
        &mut self,
        category: &StoppageCategory,
    ) -> impl Future<Output = Result<Option<OpenStoppage>, Self::Error>> + Send;

    fn list_open_stoppages(
        &mut self,
    ) -> impl Future<Output = Result<Vec<OpenStoppage>, Self::Error>> + Send;

    fn insert_stoppage(
        &mut self,
        stoppage: NewStoppage,
    ) -> impl Future<Output = Result<DbId, Self::Error>> + Send;

    fn close_stoppage(
        &mut self,
        stoppage_id: DbId,
        closure: StoppageClosure,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn update_machine_status(
        &mut self,
        label: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
