use serde::Serialize;
use shopfloor_core::types::{DbId, Matricula, Timestamp};
use sqlx::FromRow;

/// A row from `redefinicoes_senha`: one per password change.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PasswordReset {
    pub id: DbId,
    pub matricula: Matricula,
    pub requested_at: Timestamp,
    /// Administrator who forced the reset; `None` for self-service changes.
    pub requested_by: Option<Matricula>,
}
