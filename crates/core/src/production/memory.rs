//! In-memory [`ProductionStore`] with one async mutex per machine.
//!
//! Used to exercise the engine without a database. A transaction works on a
//! copy of the machine's records and writes it back on `commit`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::category::StoppageCategory;
use crate::error::CoreError;
use crate::production::state::LABEL_IDLE;
use crate::production::store::{
    MachineTx, NewRun, NewStoppage, OpenRun, OpenStoppage, ProductionStore, RunClosure,
    StoppageClosure,
};
use crate::types::{DbId, MachineId, Matricula, Timestamp};

#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: DbId,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub start_operator: Matricula,
    pub end_operator: Option<Matricula>,
    pub cycle_count: Option<i32>,
    pub total_seconds: Option<i64>,
    pub average_cycle_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoppageRecord {
    pub id: DbId,
    pub run_id: Option<DbId>,
    pub category: StoppageCategory,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub start_operator: Matricula,
    pub end_operator: Option<Matricula>,
    pub total_seconds: Option<i64>,
}

/// Everything stored for one machine.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineRecords {
    pub status: String,
    pub runs: Vec<RunRecord>,
    pub stoppages: Vec<StoppageRecord>,
}

impl Default for MachineRecords {
    fn default() -> Self {
        Self {
            status: LABEL_IDLE.to_string(),
            runs: Vec::new(),
            stoppages: Vec::new(),
        }
    }
}

type Slot = Arc<AsyncMutex<MachineRecords>>;

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    machines: Arc<Mutex<HashMap<MachineId, Slot>>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a machine. Registering an existing id is a `Conflict`.
    pub fn add_machine(&self, machine_id: &str) -> Result<(), CoreError> {
        let mut machines = self.machines()?;
        if machines.contains_key(machine_id) {
            return Err(CoreError::Conflict(format!(
                "Machine {machine_id} already exists"
            )));
        }
        machines.insert(machine_id.to_string(), Slot::default());
        Ok(())
    }

    /// Copy of a machine's records, waiting for any in-flight transaction.
    pub async fn records(&self, machine_id: &str) -> Result<MachineRecords, CoreError> {
        let slot = self.slot(machine_id)?;
        let guard = slot.lock().await;
        Ok(guard.clone())
    }

    fn machines(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<MachineId, Slot>>, CoreError> {
        self.machines
            .lock()
            .map_err(|_| CoreError::Internal("machine registry lock poisoned".into()))
    }

    fn slot(&self, machine_id: &str) -> Result<Slot, CoreError> {
        self.machines()?
            .get(machine_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Machine", machine_id))
    }
}

impl ProductionStore for MemoryStore {
    type Error = CoreError;
    type Tx = MemoryTx;

    async fn lock_machine(&self, machine_id: &str) -> Result<MemoryTx, CoreError> {
        let slot = self.slot(machine_id)?;
        let guard = slot.lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx {
            machine_id: machine_id.to_string(),
            guard,
            working,
            next_id: Arc::clone(&self.next_id),
        })
    }
}

pub struct MemoryTx {
    machine_id: MachineId,
    guard: OwnedMutexGuard<MachineRecords>,
    working: MachineRecords,
    next_id: Arc<AtomicI64>,
}

impl MemoryTx {
    fn allocate_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn open_run(&self) -> Option<&RunRecord> {
        self.working.runs.iter().find(|r| r.ended_at.is_none())
    }

    fn to_open_stoppage(&self, s: &StoppageRecord) -> OpenStoppage {
        OpenStoppage {
            id: s.id,
            machine_id: self.machine_id.clone(),
            run_id: s.run_id,
            category: s.category.clone(),
            started_at: s.started_at,
            start_operator: s.start_operator.clone(),
        }
    }
}

impl MachineTx for MemoryTx {
    type Error = CoreError;

    async fn find_open_run(&mut self) -> Result<Option<OpenRun>, CoreError> {
        Ok(self.open_run().map(|r| OpenRun {
            id: r.id,
            machine_id: self.machine_id.clone(),
            started_at: r.started_at,
            start_operator: r.start_operator.clone(),
            cycle_count: r.cycle_count,
        }))
    }

    async fn insert_run(&mut self, run: NewRun) -> Result<DbId, CoreError> {
        if self.open_run().is_some() {
            return Err(CoreError::Conflict(format!(
                "Machine {} already has an open run",
                self.machine_id
            )));
        }
        let id = self.allocate_id();
        self.working.runs.push(RunRecord {
            id,
            started_at: run.started_at,
            ended_at: None,
            start_operator: run.start_operator,
            end_operator: None,
            cycle_count: None,
            total_seconds: None,
            average_cycle_seconds: None,
        });
        Ok(id)
    }

    async fn close_run(&mut self, run_id: DbId, closure: RunClosure) -> Result<(), CoreError> {
        let run = self
            .working
            .runs
            .iter_mut()
            .find(|r| r.id == run_id && r.ended_at.is_none())
            .ok_or_else(|| CoreError::not_found("Open run", run_id))?;
        run.ended_at = Some(closure.ended_at);
        run.end_operator = Some(closure.end_operator);
        run.total_seconds = Some(closure.total_seconds);
        run.average_cycle_seconds = closure.average_cycle_seconds;
        Ok(())
    }

    async fn set_cycle_count(&mut self, run_id: DbId, cycles: i32) -> Result<(), CoreError> {
        let run = self
            .working
            .runs
            .iter_mut()
            .find(|r| r.id == run_id && r.ended_at.is_none())
            .ok_or_else(|| CoreError::not_found("Open run", run_id))?;
        run.cycle_count = Some(cycles);
        Ok(())
    }

    async fn find_open_stoppage(
        &mut self,
        category: &StoppageCategory,
    ) -> Result<Option<OpenStoppage>, CoreError> {
        Ok(self
            .working
            .stoppages
            .iter()
            .find(|s| s.ended_at.is_none() && &s.category == category)
            .map(|s| self.to_open_stoppage(s)))
    }

    async fn list_open_stoppages(&mut self) -> Result<Vec<OpenStoppage>, CoreError> {
        Ok(self
            .working
            .stoppages
            .iter()
            .filter(|s| s.ended_at.is_none())
            .map(|s| self.to_open_stoppage(s))
            .collect())
    }

    async fn insert_stoppage(&mut self, stoppage: NewStoppage) -> Result<DbId, CoreError> {
        let duplicate = self
            .working
            .stoppages
            .iter()
            .any(|s| s.ended_at.is_none() && s.category == stoppage.category);
        if duplicate {
            return Err(CoreError::Conflict(format!(
                "Machine {} already has an open '{}' stoppage",
                self.machine_id, stoppage.category
            )));
        }
        let id = self.allocate_id();
        self.working.stoppages.push(StoppageRecord {
            id,
            run_id: stoppage.run_id,
            category: stoppage.category,
            started_at: stoppage.started_at,
            ended_at: None,
            start_operator: stoppage.start_operator,
            end_operator: None,
            total_seconds: None,
        });
        Ok(id)
    }

    async fn close_stoppage(
        &mut self,
        stoppage_id: DbId,
        closure: StoppageClosure,
    ) -> Result<(), CoreError> {
        let stoppage = self
            .working
            .stoppages
            .iter_mut()
            .find(|s| s.id == stoppage_id && s.ended_at.is_none())
            .ok_or_else(|| CoreError::not_found("Open stoppage", stoppage_id))?;
        stoppage.ended_at = Some(closure.ended_at);
        stoppage.end_operator = Some(closure.end_operator);
        stoppage.total_seconds = Some(closure.total_seconds);
        Ok(())
    }

    async fn update_machine_status(&mut self, label: &str) -> Result<(), CoreError> {
        self.working.status = label.to_string();
        Ok(())
    }

    async fn commit(mut self) -> Result<(), CoreError> {
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
