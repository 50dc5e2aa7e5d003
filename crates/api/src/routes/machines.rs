//! Route definitions for machines and their production state.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{machines, production};
use crate::state::AppState;

/// Routes mounted at `/maquinas`.
///
/// ```text
/// GET, POST          /                (create: admin)
/// GET, PUT, DELETE   /{id}            (update/delete: admin)
/// GET                /{id}/painel     status page data
/// POST               /{id}/ciclos     record cycles of the open run
/// POST               /{id}/producao   toggle run, returns outcome
/// POST               /{id}/paradas    toggle stoppage, returns outcome
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(machines::list_machines).post(machines::create_machine),
        )
        .route(
            "/{id}",
            get(machines::get_machine)
                .put(machines::update_machine)
                .delete(machines::delete_machine),
        )
        .route("/{id}/painel", get(machines::machine_panel))
        .route("/{id}/ciclos", post(machines::record_cycles))
        .route("/{id}/producao", post(production::toggle_run_json))
        .route("/{id}/paradas", post(production::toggle_stoppage_json))
}
