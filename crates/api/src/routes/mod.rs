pub mod admin;
pub mod auth;
pub mod health;
pub mod machines;
pub mod production;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                                    login (public)
/// /auth/refresh                                  refresh (public)
/// /auth/logout                                   logout
/// /auth/me                                       current user
/// /auth/change-password                          change own password
///
/// /admin/usuarios                                list, create (admin only)
/// /admin/usuarios/{matricula}                    get, update, delete
/// /admin/usuarios/{matricula}/reset-password     reset password
/// /admin/usuarios/{matricula}/redefinicoes-senha password reset log
/// /admin/import/atividades                       import legacy runs
/// /admin/import/paradas                          import legacy stoppages
///
/// /maquinas                                      list, create
/// /maquinas/{id}                                 get, update, delete
/// /maquinas/{id}/painel                          status page data
/// /maquinas/{id}/ciclos                          record cycles
/// /maquinas/{id}/producao                        toggle run
/// /maquinas/{id}/paradas                         toggle stoppage
///
/// /setores                                       machines grouped by sector
/// /paradas/categorias                            accepted stoppage categories
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/maquinas", machines::router())
        .route("/setores", get(handlers::machines::sector_tree))
        .route(
            "/paradas/categorias",
            get(handlers::machines::list_categories),
        )
}
