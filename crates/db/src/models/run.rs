//! Production run ("atividade") model.

use serde::Serialize;
use shopfloor_core::types::{DbId, MachineId, Matricula, Timestamp};
use sqlx::FromRow;

/// A row from the `atividades` table. Open while `ended_at` is `None`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Run {
    pub id: DbId,
    pub machine_id: MachineId,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub start_operator: Matricula,
    pub end_operator: Option<Matricula>,
    pub cycle_count: Option<i32>,
    pub total_seconds: Option<i64>,
    pub average_cycle_seconds: Option<f64>,
}
