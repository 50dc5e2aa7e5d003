//! User entity model and DTOs.

use serde::Serialize;
use shopfloor_core::roles::Role;
use shopfloor_core::types::{Matricula, Timestamp};
use sqlx::FromRow;

/// Full user row from the `usuarios` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub matricula: Matricula,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: Timestamp,
    pub created_by: Option<Matricula>,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<Matricula>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_stored(&self.role)
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub matricula: Matricula,
    pub name: String,
    pub role: Role,
    pub created_at: Timestamp,
    pub created_by: Option<Matricula>,
    pub updated_at: Option<Timestamp>,
    pub updated_by: Option<Matricula>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            role: user.role(),
            matricula: user.matricula,
            name: user.name,
            created_at: user.created_at,
            created_by: user.created_by,
            updated_at: user.updated_at,
            updated_by: user.updated_by,
        }
    }
}

/// DTO for inserting a user. The password is already hashed.
#[derive(Debug)]
pub struct CreateUser {
    pub matricula: Matricula,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub created_by: Option<Matricula>,
}

/// DTO for updating a user. `None` fields keep their current value.
#[derive(Debug)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
    pub updated_by: Matricula,
}
