//! Administrator handlers for the `/admin/usuarios` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shopfloor_core::accounts::{ensure_not_self, require_identifier, validate_new_password};
use shopfloor_core::error::CoreError;
use shopfloor_core::roles::Role;
use shopfloor_db::models::password_reset::PasswordReset;
use shopfloor_db::models::user::{CreateUser, UpdateUser, UserResponse};
use shopfloor_db::repositories::{PasswordResetRepo, SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::password::hash_for_storage;
use crate::error::{AppError, AppResult};
use crate::handlers::ensure_deleted;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 32))]
    pub matricula: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

/// Fields left out keep their current value. A new password must come with
/// its confirmation.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

/// POST /api/v1/admin/usuarios
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;
    let matricula = require_identifier("Matricula", &input.matricula)?.to_string();
    let name = require_identifier("Name", &input.name)?.to_string();
    let role = Role::parse(&input.role)?;
    validate_new_password(&input.password, &input.confirm_password)?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            matricula,
            name,
            password_hash: hash_for_storage(&input.password)?,
            role,
            created_by: Some(admin.matricula.clone()),
        },
    )
    .await?;

    tracing::info!(matricula = %user.matricula, role = %role, admin = %admin.matricula, "User created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: user.into() }),
    ))
}

/// GET /api/v1/admin/usuarios
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/v1/admin/usuarios/{matricula}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(matricula): Path<String>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_matricula(&state.pool, &matricula)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &matricula))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/admin/usuarios/{matricula}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(matricula): Path<String>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;
    let name = input
        .name
        .as_deref()
        .map(|n| require_identifier("Name", n).map(str::to_string))
        .transpose()?;
    let role = input.role.as_deref().map(Role::parse).transpose()?;

    let password_hash = match input.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            let confirmation = input.confirm_password.as_deref().unwrap_or_default();
            validate_new_password(password, confirmation)?;
            Some(hash_for_storage(password)?)
        }
        None => None,
    };
    let password_changed = password_hash.is_some();
    let previous_role = match role {
        Some(_) => UserRepo::find_by_matricula(&state.pool, &matricula)
            .await?
            .map(|u| u.role()),
        None => None,
    };

    let user = UserRepo::update(
        &state.pool,
        &matricula,
        &UpdateUser {
            name,
            role,
            password_hash,
            updated_by: admin.matricula.clone(),
        },
    )
    .await?
    .ok_or_else(|| CoreError::not_found("User", &matricula))?;

    // Refresh tokens must not outlive a credential or privilege change.
    let role_changed = previous_role.is_some_and(|prev| prev != user.role());
    if password_changed || role_changed {
        SessionRepo::revoke_all_for_user(&state.pool, &matricula).await?;
    }

    tracing::info!(
        matricula = %matricula,
        admin = %admin.matricula,
        password_changed,
        role_changed,
        "User updated"
    );
    Ok(Json(DataResponse { data: user.into() }))
}

/// DELETE /api/v1/admin/usuarios/{matricula}
///
/// Refused for the caller's own account and for users referenced by any run
/// or stoppage.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(matricula): Path<String>,
) -> AppResult<StatusCode> {
    ensure_not_self(&admin.matricula, &matricula)?;

    let outcome = UserRepo::delete_if_unreferenced(&state.pool, &matricula).await?;
    ensure_deleted("User", &matricula, outcome)?;

    tracing::info!(matricula = %matricula, admin = %admin.matricula, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/usuarios/{matricula}/reset-password
///
/// Sets a new password chosen by the administrator and revokes the user's
/// refresh sessions.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(matricula): Path<String>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_new_password(&input.new_password, &input.confirm_password)?;

    let hash = hash_for_storage(&input.new_password)?;
    let updated =
        UserRepo::reset_password(&state.pool, &matricula, &hash, Some(&admin.matricula)).await?;
    if !updated {
        return Err(AppError::Core(CoreError::not_found("User", &matricula)));
    }
    SessionRepo::revoke_all_for_user(&state.pool, &matricula).await?;

    tracing::info!(matricula = %matricula, admin = %admin.matricula, "Password reset");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/usuarios/{matricula}/redefinicoes-senha
pub async fn list_password_resets(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(matricula): Path<String>,
) -> AppResult<Json<DataResponse<Vec<PasswordReset>>>> {
    if UserRepo::find_by_matricula(&state.pool, &matricula)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::not_found("User", &matricula)));
    }
    let resets = PasswordResetRepo::list_for_user(&state.pool, &matricula).await?;
    Ok(Json(DataResponse { data: resets }))
}
