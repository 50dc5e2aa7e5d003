//! Administrator import of history exported by the legacy system.
//!
//! Rows carry split `YYYY-MM-DD` / `HH:MM:SS` fields which are converted to
//! instants with the configured legacy UTC offset. A batch is all-or-nothing.

use std::collections::{BTreeSet, HashSet};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shopfloor_core::error::CoreError;
use shopfloor_core::legacy::{ImportedRun, ImportedStoppage, LegacyRunRow, LegacyStoppageRow};
use shopfloor_db::repositories::{MachineRepo, RunRepo, StoppageRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest<T> {
    pub rows: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub machines: Vec<String>,
}

/// POST /api/v1/admin/import/atividades
pub async fn import_runs(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ImportRequest<LegacyRunRow>>,
) -> AppResult<(StatusCode, Json<DataResponse<ImportSummary>>)> {
    let offset = state.config.production.legacy_utc_offset;
    let runs = input
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| row.convert(offset).map_err(|e| at_row(i, e)))
        .collect::<Result<Vec<ImportedRun>, _>>()?;

    let mut open_machines = HashSet::new();
    for run in runs.iter().filter(|r| r.ended_at.is_none()) {
        if !open_machines.insert(run.machine_id.as_str()) {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Batch contains more than one open run for machine {}",
                run.machine_id
            ))));
        }
    }

    let machines = distinct_machines(runs.iter().map(|r| r.machine_id.as_str()));
    ensure_machines_exist(&state, &machines).await?;

    let inserted = RunRepo::import_batch(&state.pool, &runs).await?;
    resync(&state, &machines).await?;

    tracing::info!(admin = %admin.matricula, rows = inserted.len(), machines = machines.len(), "Runs imported");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ImportSummary {
                imported: inserted.len(),
                machines,
            },
        }),
    ))
}

/// POST /api/v1/admin/import/paradas
///
/// Historical categories are kept as exported, even when the current catalog
/// no longer lists them.
pub async fn import_stoppages(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ImportRequest<LegacyStoppageRow>>,
) -> AppResult<(StatusCode, Json<DataResponse<ImportSummary>>)> {
    let offset = state.config.production.legacy_utc_offset;
    let stoppages = input
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| row.convert(offset).map_err(|e| at_row(i, e)))
        .collect::<Result<Vec<ImportedStoppage>, _>>()?;

    let mut open_pairs = HashSet::new();
    for stoppage in stoppages.iter().filter(|s| s.ended_at.is_none()) {
        if !open_pairs.insert((stoppage.machine_id.as_str(), stoppage.category.as_str())) {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Batch contains more than one open '{}' stoppage for machine {}",
                stoppage.category, stoppage.machine_id
            ))));
        }
    }

    let machines = distinct_machines(stoppages.iter().map(|s| s.machine_id.as_str()));
    ensure_machines_exist(&state, &machines).await?;

    let inserted = StoppageRepo::import_batch(&state.pool, &stoppages).await?;
    resync(&state, &machines).await?;

    tracing::info!(admin = %admin.matricula, rows = inserted.len(), machines = machines.len(), "Stoppages imported");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ImportSummary {
                imported: inserted.len(),
                machines,
            },
        }),
    ))
}

/// Prefix a conversion error with the (zero-based) row it came from.
fn at_row(index: usize, err: CoreError) -> CoreError {
    match err {
        CoreError::MalformedTimestamp(msg) => {
            CoreError::MalformedTimestamp(format!("row {index}: {msg}"))
        }
        CoreError::Validation(msg) => CoreError::Validation(format!("row {index}: {msg}")),
        other => other,
    }
}

fn distinct_machines<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    ids.collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

async fn ensure_machines_exist(state: &AppState, machines: &[String]) -> AppResult<()> {
    for id in machines {
        if !MachineRepo::exists(&state.pool, id).await? {
            return Err(AppError::Core(CoreError::not_found("Machine", id)));
        }
    }
    Ok(())
}

/// Imported open records change what the status label should say.
async fn resync(state: &AppState, machines: &[String]) -> AppResult<()> {
    for id in machines {
        state.engine.resync_status(id).await?;
    }
    Ok(())
}
