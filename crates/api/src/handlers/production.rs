//! Run and stoppage transitions.
//!
//! The operator form endpoints (`/controle_producao`, `/acao_producao`,
//! `/acao_parada`) answer with a redirect or 204; the `/api/v1` variants return
//! the transition outcome as JSON. All of them hand the caller's
//! [`SessionContext`](shopfloor_core::session::SessionContext) to the engine,
//! which refuses anonymous callers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use shopfloor_core::production::{RunOutcome, StoppageOutcome};

use crate::error::AppResult;
use crate::middleware::auth::Session;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for stoppage toggles.
#[derive(Debug, Deserialize)]
pub struct StoppageRequest {
    #[serde(alias = "tipo", alias = "tipo_parada")]
    pub category: String,
}

/// Status page a run toggle redirects to.
pub fn panel_path(machine_id: &str) -> String {
    format!("/api/v1/maquinas/{machine_id}/painel")
}

async fn toggle_run(state: &AppState, session: &Session, machine_id: &str) -> AppResult<RunOutcome> {
    let outcome = state
        .engine
        .toggle_run(&session.0, machine_id, Utc::now())
        .await?;
    tracing::info!(
        machine_id = %machine_id,
        operator = session.0.current_operator_id().unwrap_or_default(),
        transition = ?outcome.transition,
        run_id = outcome.run_id,
        status = %outcome.status_label,
        "Run toggled"
    );
    Ok(outcome)
}

async fn toggle_stoppage(
    state: &AppState,
    session: &Session,
    machine_id: &str,
    category: &str,
) -> AppResult<StoppageOutcome> {
    let outcome = state
        .engine
        .toggle_stoppage(&session.0, machine_id, category, Utc::now())
        .await?;
    tracing::info!(
        machine_id = %machine_id,
        operator = session.0.current_operator_id().unwrap_or_default(),
        category = %outcome.category,
        transition = ?outcome.transition,
        stoppage_id = outcome.stoppage_id,
        status = %outcome.status_label,
        "Stoppage toggled"
    );
    Ok(outcome)
}

/// POST /controle_producao/{machine_id}
///
/// Toggle the run, then redirect (303) to the machine's status page.
pub async fn toggle_run_and_redirect(
    State(state): State<AppState>,
    session: Session,
    Path(machine_id): Path<String>,
) -> AppResult<Redirect> {
    toggle_run(&state, &session, &machine_id).await?;
    Ok(Redirect::to(&panel_path(&machine_id)))
}

/// POST /acao_producao/{machine_id}
pub async fn toggle_run_no_content(
    State(state): State<AppState>,
    session: Session,
    Path(machine_id): Path<String>,
) -> AppResult<StatusCode> {
    toggle_run(&state, &session, &machine_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /acao_parada/{machine_id}
pub async fn toggle_stoppage_no_content(
    State(state): State<AppState>,
    session: Session,
    Path(machine_id): Path<String>,
    Json(input): Json<StoppageRequest>,
) -> AppResult<StatusCode> {
    toggle_stoppage(&state, &session, &machine_id, &input.category).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/maquinas/{machine_id}/producao
pub async fn toggle_run_json(
    State(state): State<AppState>,
    session: Session,
    Path(machine_id): Path<String>,
) -> AppResult<Json<DataResponse<RunOutcome>>> {
    let outcome = toggle_run(&state, &session, &machine_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/maquinas/{machine_id}/paradas
pub async fn toggle_stoppage_json(
    State(state): State<AppState>,
    session: Session,
    Path(machine_id): Path<String>,
    Json(input): Json<StoppageRequest>,
) -> AppResult<Json<DataResponse<StoppageOutcome>>> {
    let outcome = toggle_stoppage(&state, &session, &machine_id, &input.category).await?;
    Ok(Json(DataResponse { data: outcome }))
}
