//! Handlers for the `/maquinas` resource, the sector tree, and the category list.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shopfloor_core::accounts::require_identifier;
use shopfloor_core::error::CoreError;
use shopfloor_core::production::{MachineSnapshot, MachineState, OpenRun, OpenStoppage};
use shopfloor_core::types::MachineId;
use shopfloor_db::models::machine::{CreateMachine, Machine, UpdateMachine};
use shopfloor_db::models::run::Run;
use shopfloor_db::repositories::{MachineRepo, RunRepo};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::ensure_deleted;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// Runs shown on the machine panel.
const PANEL_RECENT_RUNS: i64 = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMachineRequest {
    #[validate(length(min = 1, max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 120))]
    pub sector: String,
    #[validate(length(min = 1, max = 120))]
    pub machine_type: String,
    #[validate(range(min = 0))]
    pub hourly_target: i32,
    #[validate(range(min = 0))]
    pub daily_target: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMachineRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub sector: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub machine_type: Option<String>,
    #[validate(range(min = 0))]
    pub hourly_target: Option<i32>,
    #[validate(range(min = 0))]
    pub daily_target: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RecordCyclesRequest {
    pub cycles: i32,
}

#[derive(Debug, Serialize)]
pub struct CyclesRecorded {
    pub run_id: i64,
    pub cycles: i32,
}

/// Entry of the sector tree.
#[derive(Debug, Serialize)]
pub struct SectorEntry {
    pub id: MachineId,
    pub name: String,
}

/// Everything the status page of one machine shows.
#[derive(Debug, Serialize)]
pub struct MachinePanel {
    pub machine: Machine,
    pub state: MachineState,
    pub status_label: String,
    pub open_run: Option<OpenRun>,
    pub open_stoppages: Vec<OpenStoppage>,
    pub recent_runs: Vec<Run>,
}

/// POST /api/v1/maquinas
pub async fn create_machine(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateMachineRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Machine>>)> {
    input.validate()?;
    let machine = MachineRepo::create(
        &state.pool,
        &CreateMachine {
            id: require_identifier("Machine id", &input.id)?.to_string(),
            name: require_identifier("Name", &input.name)?.to_string(),
            sector: require_identifier("Sector", &input.sector)?.to_string(),
            machine_type: require_identifier("Machine type", &input.machine_type)?.to_string(),
            hourly_target: input.hourly_target,
            daily_target: input.daily_target,
            created_by: Some(admin.matricula.clone()),
        },
    )
    .await?;

    tracing::info!(machine_id = %machine.id, admin = %admin.matricula, "Machine created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: machine })))
}

/// GET /api/v1/maquinas
pub async fn list_machines(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<Machine>>>> {
    let machines = MachineRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: machines }))
}

/// GET /api/v1/maquinas/{id}
pub async fn get_machine(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Machine>>> {
    let machine = MachineRepo::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| CoreError::not_found("Machine", &id))?;
    Ok(Json(DataResponse { data: machine }))
}

/// PUT /api/v1/maquinas/{id}
pub async fn update_machine(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(input): Json<UpdateMachineRequest>,
) -> AppResult<Json<DataResponse<Machine>>> {
    input.validate()?;
    let machine = MachineRepo::update(
        &state.pool,
        &id,
        &UpdateMachine {
            name: trimmed("Name", input.name)?,
            sector: trimmed("Sector", input.sector)?,
            machine_type: trimmed("Machine type", input.machine_type)?,
            hourly_target: input.hourly_target,
            daily_target: input.daily_target,
            updated_by: admin.matricula.clone(),
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("Machine", &id))?;

    tracing::info!(machine_id = %id, admin = %admin.matricula, "Machine updated");
    Ok(Json(DataResponse { data: machine }))
}

fn trimmed(field: &str, value: Option<String>) -> Result<Option<String>, CoreError> {
    value
        .map(|v| require_identifier(field, &v).map(str::to_string))
        .transpose()
}

/// DELETE /api/v1/maquinas/{id}
///
/// Refused while any run or stoppage references the machine.
pub async fn delete_machine(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let outcome = MachineRepo::delete_if_unreferenced(&state.pool, &id).await?;
    ensure_deleted("Machine", &id, outcome)?;

    tracing::info!(machine_id = %id, admin = %admin.matricula, "Machine deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/setores
///
/// Machines grouped by sector: `{ "<sector>": [{ "id", "name" }] }`.
pub async fn sector_tree(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> AppResult<Json<BTreeMap<String, Vec<SectorEntry>>>> {
    let rows = MachineRepo::list_by_sector(&state.pool).await?;
    let mut tree: BTreeMap<String, Vec<SectorEntry>> = BTreeMap::new();
    for row in rows {
        tree.entry(row.sector).or_default().push(SectorEntry {
            id: row.id,
            name: row.name,
        });
    }
    Ok(Json(tree))
}

/// GET /api/v1/paradas/categorias
pub async fn list_categories(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Json<DataResponse<Vec<String>>> {
    Json(DataResponse {
        data: state.engine.catalog().labels().to_vec(),
    })
}

/// GET /api/v1/maquinas/{id}/painel
pub async fn machine_panel(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<MachinePanel>>> {
    let machine = MachineRepo::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| CoreError::not_found("Machine", &id))?;
    let MachineSnapshot {
        state: machine_state,
        status_label,
        open_run,
        open_stoppages,
    } = state.engine.snapshot(&id).await?;
    let recent_runs = RunRepo::list_recent_for_machine(&state.pool, &id, PANEL_RECENT_RUNS).await?;

    Ok(Json(DataResponse {
        data: MachinePanel {
            machine,
            state: machine_state,
            status_label,
            open_run,
            open_stoppages,
            recent_runs,
        },
    }))
}

/// POST /api/v1/maquinas/{id}/ciclos
///
/// Set the cycle count of the machine's open run.
pub async fn record_cycles(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Json(input): Json<RecordCyclesRequest>,
) -> AppResult<Json<DataResponse<CyclesRecorded>>> {
    let run_id = state
        .engine
        .record_cycles(&user.session(), &id, input.cycles)
        .await?;

    tracing::info!(machine_id = %id, operator = %user.matricula, run_id, cycles = input.cycles, "Cycles recorded");
    Ok(Json(DataResponse {
        data: CyclesRecorded {
            run_id,
            cycles: input.cycles,
        },
    }))
}
