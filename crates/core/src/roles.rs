//! Well-known role names stored in `usuarios.perfil`.
//!
//! These must match the values written by the user admin endpoints and the
//! bootstrap administrator.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "Administrador";
pub const ROLE_OPERATOR: &str = "Operador";

/// Access level of an authenticated user.
///
/// Only administrators may manage users and machines; every other profile is
/// treated as an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Administrador")]
    Administrator,
    #[serde(rename = "Operador")]
    Operator,
}

impl Role {
    /// The value persisted in `usuarios.perfil` and embedded in tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => ROLE_ADMIN,
            Self::Operator => ROLE_OPERATOR,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Administrator)
    }

    /// Strict parse used on user input.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim() {
            ROLE_ADMIN => Ok(Self::Administrator),
            ROLE_OPERATOR => Ok(Self::Operator),
            other => Err(CoreError::Validation(format!(
                "Unknown role '{other}'. Valid roles: {ROLE_ADMIN}, {ROLE_OPERATOR}"
            ))),
        }
    }

    /// Lenient mapping for stored values: anything that is not the admin
    /// profile is an operator.
    pub fn from_stored(raw: &str) -> Self {
        if raw == ROLE_ADMIN {
            Self::Administrator
        } else {
            Self::Operator
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
