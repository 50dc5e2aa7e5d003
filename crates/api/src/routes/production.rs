//! Operator form endpoints, mounted at the root (NOT under `/api/v1`).

use axum::routing::post;
use axum::Router;

use crate::handlers::production;
use crate::state::AppState;

/// ```text
/// POST /controle_producao/{machine_id}  toggle run, 303 to the status page
/// POST /acao_producao/{machine_id}      toggle run, 204
/// POST /acao_parada/{machine_id}        toggle stoppage {category}, 204
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/controle_producao/{machine_id}",
            post(production::toggle_run_and_redirect),
        )
        .route(
            "/acao_producao/{machine_id}",
            post(production::toggle_run_no_content),
        )
        .route(
            "/acao_parada/{machine_id}",
            post(production::toggle_stoppage_no_content),
        )
}
