//! Handlers for the `/auth` resource (login, refresh, logout, password change).

use axum::extract::State;
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopfloor_core::accounts::validate_new_password;
use shopfloor_core::error::CoreError;
use shopfloor_core::roles::Role;
use shopfloor_db::models::session::CreateSession;
use shopfloor_db::models::user::User;
use shopfloor_db::repositories::{SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::{
    clear_session_cookie, generate_access_token, generate_refresh_token, hash_refresh_token,
    session_cookie,
};
use crate::auth::password::{hash_for_storage, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub matricula: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /auth/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub matricula: String,
    pub name: String,
    pub role: Role,
}

const INVALID_CREDENTIALS: &str = "Invalid matricula or password";

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with matricula + password. Returns access and refresh tokens
/// and sets the session cookie.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let matricula = input.matricula.trim();

    let user = UserRepo::find_by_matricula(&state.pool, matricula)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into())))?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::warn!(matricula = %user.matricula, "Login failed: wrong password");
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    let pruned = SessionRepo::cleanup_expired(&state.pool).await?;
    if pruned > 0 {
        tracing::debug!(pruned, "Expired sessions removed");
    }

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let response = create_auth_response(&state, &user, user_agent).await?;
    tracing::info!(matricula = %user.matricula, role = %user.role(), "User logged in");

    let cookie = session_cookie(&response.access_token, &state.config.jwt);
    Ok(([(SET_COOKIE, cookie)], Json(response)))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens. The old
/// refresh token is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    SessionRepo::revoke(&state.pool, session.id).await?;

    let user = UserRepo::find_by_matricula(&state.pool, &session.matricula)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let response = create_auth_response(&state, &user, user_agent).await?;

    let cookie = session_cookie(&response.access_token, &state.config.jwt);
    Ok(([(SET_COOKIE, cookie)], Json(response)))
}

/// POST /api/v1/auth/logout
///
/// Revoke all refresh sessions of the user and clear the session cookie.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, &auth_user.matricula).await?;
    tracing::info!(matricula = %auth_user.matricula, revoked, "User logged out");

    let cookie = clear_session_cookie(&state.config.jwt);
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)]))
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Json<UserInfo>> {
    let user = UserRepo::find_by_matricula(&state.pool, &auth_user.matricula)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;
    Ok(Json(user_info(&user)))
}

/// POST /api/v1/auth/change-password
///
/// Self-service password change. Requires the current password; other
/// sessions of the user are revoked.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    validate_new_password(&input.new_password, &input.confirm_password)?;

    let user = UserRepo::find_by_matricula(&state.pool, &auth_user.matricula)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Validation(
            "Current password is incorrect".into(),
        )));
    }

    let hash = hash_for_storage(&input.new_password)?;
    UserRepo::reset_password(&state.pool, &user.matricula, &hash, None).await?;
    SessionRepo::revoke_all_for_user(&state.pool, &user.matricula).await?;

    tracing::info!(matricula = %user.matricula, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        matricula: user.matricula.clone(),
        name: user.name.clone(),
        role: user.role(),
    }
}

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(
    state: &AppState,
    user: &User,
    user_agent: Option<String>,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(&user.matricula, user.role(), &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            matricula: user.matricula.clone(),
            refresh_token_hash: refresh_hash,
            expires_at,
            user_agent,
            ip_address: None,
        },
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: user_info(user),
    })
}
