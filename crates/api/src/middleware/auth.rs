//! Token-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use shopfloor_core::error::CoreError;
use shopfloor_core::roles::Role;
use shopfloor_core::session::SessionContext;
use shopfloor_core::types::Matricula;

use crate::auth::jwt::{token_from_cookie_header, validate_token};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the access token.
///
/// The token is read from `Authorization: Bearer <token>` first, then from
/// the `shopfloor_session` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub matricula: Matricula,
    pub role: Role,
}

impl AuthUser {
    /// The session context handed to core operations.
    pub fn session(&self) -> SessionContext {
        SessionContext::authenticated(self.matricula.clone(), self.role)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = request_token(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header or session cookie".into(),
            ))
        })?;
        authenticate(token, state)
    }
}

/// Explicit session context for operations that decide themselves whether an
/// anonymous caller is allowed.
///
/// A missing token yields an anonymous session; a present but invalid token
/// is still rejected with 401.
#[derive(Debug, Clone)]
pub struct Session(pub SessionContext);

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match request_token(parts)? {
            Some(token) => Ok(Session(authenticate(token, state)?.session())),
            None => Ok(Session(SessionContext::anonymous())),
        }
    }
}

fn request_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let token = header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Invalid Authorization format. Expected: Bearer <token>".into(),
                ))
            })?;
        return Ok(Some(token));
    }

    Ok(parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(token_from_cookie_header))
}

fn authenticate(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    Ok(AuthUser {
        role: Role::from_stored(&claims.role),
        matricula: claims.sub,
    })
}
