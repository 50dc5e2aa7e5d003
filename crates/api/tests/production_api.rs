//! End-to-end flows through the HTTP layer against Postgres.

mod common;

use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use serde_json::json;
use shopfloor_api::auth::password::hash_password;
use shopfloor_core::roles::Role;
use shopfloor_db::models::machine::CreateMachine;
use shopfloor_db::models::user::CreateUser;
use shopfloor_db::repositories::{MachineRepo, UserRepo};
use sqlx::PgPool;

use common::{
    admin_token, assert_error, body_json, build_test_app, get, operator_token, post_json,
    request, send, ADMIN, OPERATOR,
};

async fn seed(pool: &PgPool) {
    for (matricula, role) in [(ADMIN, Role::Administrator), (OPERATOR, Role::Operator)] {
        UserRepo::create(
            pool,
            &CreateUser {
                matricula: matricula.to_string(),
                name: format!("Usuário {matricula}"),
                password_hash: hash_password("segredo1").unwrap(),
                role,
                created_by: None,
            },
        )
        .await
        .unwrap();
    }
    MachineRepo::create(
        pool,
        &CreateMachine {
            id: "M1".into(),
            name: "Prensa 1".into(),
            sector: "Estamparia".into(),
            machine_type: "Prensa".into(),
            hourly_target: 60,
            daily_target: 480,
            created_by: Some(ADMIN.into()),
        },
    )
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_sets_session_cookie(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        None,
        json!({ "matricula": OPERATOR, "password": "segredo1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("shopfloor_session="));
    let json = body_json(response).await;
    assert_eq!(json["user"]["role"], "Operador");

    let refreshed = post_json(
        app.clone(),
        "/api/v1/auth/refresh",
        None,
        json!({ "refresh_token": json["refresh_token"] }),
    )
    .await;
    assert_eq!(refreshed.status(), StatusCode::OK);

    // The first refresh token was rotated out.
    let reused = post_json(
        app,
        "/api/v1/auth/refresh",
        None,
        json!({ "refresh_token": json["refresh_token"] }),
    )
    .await;
    assert_error(reused, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_is_unauthorized(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/login",
        None,
        json!({ "matricula": OPERATOR, "password": "errada" }),
    )
    .await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn run_and_stoppage_toggles_drive_the_panel(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);
    let token = operator_token();

    let started = send(
        app.clone(),
        request("POST", "/controle_producao/M1", Some(&token), None),
    )
    .await;
    assert_eq!(started.status(), StatusCode::SEE_OTHER);
    assert_eq!(started.headers()[LOCATION], "/api/v1/maquinas/M1/painel");

    let stopped = post_json(
        app.clone(),
        "/acao_parada/M1",
        Some(&token),
        json!({ "category": "manutenção" }),
    )
    .await;
    assert_eq!(stopped.status(), StatusCode::NO_CONTENT);

    let panel = body_json(get(app.clone(), "/api/v1/maquinas/M1/painel", Some(&token)).await).await;
    assert_eq!(panel["data"]["status_label"], "Em Manutenção");
    assert_eq!(panel["data"]["machine"]["status"], "Em Manutenção");
    assert_eq!(panel["data"]["open_stoppages"].as_array().unwrap().len(), 1);
    assert!(panel["data"]["open_run"].is_object());

    let closed = post_json(
        app.clone(),
        "/api/v1/maquinas/M1/paradas",
        Some(&token),
        json!({ "category": "Manutenção" }),
    )
    .await;
    let closed = body_json(closed).await;
    assert_eq!(closed["data"]["transition"], "closed");
    assert_eq!(closed["data"]["status_label"], "Em produção");

    let cycles = post_json(
        app.clone(),
        "/api/v1/maquinas/M1/ciclos",
        Some(&token),
        json!({ "cycles": 12 }),
    )
    .await;
    assert_eq!(cycles.status(), StatusCode::OK);

    let run = send(
        app.clone(),
        request("POST", "/acao_producao/M1", Some(&token), None),
    )
    .await;
    assert_eq!(run.status(), StatusCode::NO_CONTENT);

    let panel = body_json(get(app, "/api/v1/maquinas/M1/painel", Some(&token)).await).await;
    assert_eq!(panel["data"]["status_label"], "Parada");
    assert_eq!(panel["data"]["recent_runs"][0]["cycle_count"], 12);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_stoppage_category_is_a_validation_error(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/acao_parada/M1",
        Some(&operator_token()),
        json!({ "category": "Almoço" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Unknown stoppage category 'Almoço'"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn imported_stoppage_outside_catalog_can_be_closed(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);

    let imported = post_json(
        app.clone(),
        "/api/v1/admin/import/paradas",
        Some(&admin_token()),
        json!({ "rows": [
            { "id_maquina": "M1", "tipo_parada": "Energia",
              "data_inicio": "2024-05-01", "hora_inicio": "10:00:00",
              "operador_inicio": OPERATOR }
        ]}),
    )
    .await;
    assert_eq!(imported.status(), StatusCode::CREATED);

    let panel = body_json(get(app.clone(), "/api/v1/maquinas/M1/painel", Some(&operator_token())).await).await;
    assert_eq!(panel["data"]["status_label"], "Em Energia");

    // Field name sent by the operator terminals.
    let closed = post_json(
        app.clone(),
        "/acao_parada/M1",
        Some(&operator_token()),
        json!({ "tipo": "Energia" }),
    )
    .await;
    assert_eq!(closed.status(), StatusCode::NO_CONTENT);

    let panel = body_json(get(app, "/api/v1/maquinas/M1/painel", Some(&operator_token())).await).await;
    assert_eq!(panel["data"]["status_label"], "Parada");
    assert!(panel["data"]["open_stoppages"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_machine_is_not_found(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);
    let response = send(
        app,
        request("POST", "/acao_producao/NOPE", Some(&operator_token()), None),
    )
    .await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn referenced_operator_cannot_be_deleted(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);
    send(
        app.clone(),
        request("POST", "/acao_producao/M1", Some(&operator_token()), None),
    )
    .await;

    let response = send(
        app,
        request(
            "DELETE",
            &format!("/api/v1/admin/usuarios/{OPERATOR}"),
            Some(&admin_token()),
            None,
        ),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "REFERENTIAL_INTEGRITY").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_machine_id_conflicts(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/maquinas",
        Some(&admin_token()),
        json!({
            "id": "M1", "name": "Outra", "sector": "Estamparia",
            "machine_type": "Prensa", "hourly_target": 1, "daily_target": 8
        }),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "CONFLICT").await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn legacy_import_computes_elapsed_and_resyncs_status(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/admin/import/atividades",
        Some(&admin_token()),
        json!({ "rows": [
            { "id_maquina": "M1", "data_inicio": "2024-05-01", "hora_inicio": "08:00:00",
              "data_fim": "2024-05-01", "hora_fim": "09:30:00",
              "operador_inicio": OPERATOR, "operador_fim": OPERATOR },
            { "id_maquina": "M1", "data_inicio": "2024-05-02", "hora_inicio": "07:00:00",
              "operador_inicio": OPERATOR }
        ]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["imported"], 2);

    let panel = body_json(get(app, "/api/v1/maquinas/M1/painel", Some(&operator_token())).await).await;
    assert_eq!(panel["data"]["status_label"], "Em produção");
    let closed = panel["data"]["recent_runs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| !r["ended_at"].is_null())
        .unwrap();
    assert_eq!(closed["total_seconds"], 5400);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sector_tree_groups_machines(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);
    let json = body_json(get(app, "/api/v1/setores", Some(&operator_token())).await).await;
    assert_eq!(json["Estamparia"][0]["id"], "M1");
    assert_eq!(json["Estamparia"][0]["name"], "Prensa 1");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn role_change_revokes_refresh_sessions(pool: PgPool) {
    seed(&pool).await;
    let app = build_test_app(pool);

    let login = post_json(
        app.clone(),
        "/api/v1/auth/login",
        None,
        json!({ "matricula": OPERATOR, "password": "segredo1" }),
    )
    .await;
    let login = body_json(login).await;

    let promoted = send(
        app.clone(),
        request(
            "PUT",
            &format!("/api/v1/admin/usuarios/{OPERATOR}"),
            Some(&admin_token()),
            Some(json!({ "role": "Administrador" })),
        ),
    )
    .await;
    assert_eq!(promoted.status(), StatusCode::OK);
    assert_eq!(body_json(promoted).await["data"]["role"], "Administrador");

    let refreshed = post_json(
        app,
        "/api/v1/auth/refresh",
        None,
        json!({ "refresh_token": login["refresh_token"] }),
    )
    .await;
    assert_error(refreshed, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}
