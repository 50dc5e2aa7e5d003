//! Machine entity model and DTOs.

use serde::Serialize;
use shopfloor_core::types::{MachineId, Matricula, Timestamp};
use sqlx::FromRow;

/// A row from the `maquinas` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    pub sector: String,
    pub machine_type: String,
    pub hourly_target: i32,
    pub daily_target: i32,
    /// Last status label written by a run/stoppage transition.
    pub status: String,
    pub created_at: Timestamp,
    pub created_by: Option<Matricula>,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<Matricula>,
}

#[derive(Debug)]
pub struct CreateMachine {
    pub id: MachineId,
    pub name: String,
    pub sector: String,
    pub machine_type: String,
    pub hourly_target: i32,
    pub daily_target: i32,
    pub created_by: Option<Matricula>,
}

/// DTO for updating machine metadata. `None` fields keep their current value.
#[derive(Debug)]
pub struct UpdateMachine {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub machine_type: Option<String>,
    pub hourly_target: Option<i32>,
    pub daily_target: Option<i32>,
    pub updated_by: Matricula,
}

/// Projection used to build the sector -> machines tree.
#[derive(Debug, Clone, FromRow)]
pub struct SectorMachine {
    pub sector: String,
    pub id: MachineId,
    pub name: String,
}
