//! Stoppage ("parada") model.

use serde::Serialize;
use shopfloor_core::types::{DbId, MachineId, Matricula, Timestamp};
use sqlx::FromRow;

/// A row from the `paradas` table. Open while `ended_at` is `None`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stoppage {
    pub id: DbId,
    pub machine_id: MachineId,
    pub run_id: Option<DbId>,
    pub category: String,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub start_operator: Matricula,
    pub end_operator: Option<Matricula>,
    pub total_seconds: Option<i64>,
}
