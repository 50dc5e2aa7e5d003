//! Route definitions for the `/admin` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{import, users};
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires the administrator role.
///
/// ```text
/// GET, POST          /usuarios
/// GET, PUT, DELETE   /usuarios/{matricula}
/// POST               /usuarios/{matricula}/reset-password
/// GET                /usuarios/{matricula}/redefinicoes-senha
/// POST               /import/atividades
/// POST               /import/paradas
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(users::list_users).post(users::create_user))
        .route(
            "/usuarios/{matricula}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/usuarios/{matricula}/reset-password",
            post(users::reset_password),
        )
        .route(
            "/usuarios/{matricula}/redefinicoes-senha",
            get(users::list_password_resets),
        )
        .route("/import/atividades", post(import::import_runs))
        .route("/import/paradas", post(import::import_stoppages))
}
