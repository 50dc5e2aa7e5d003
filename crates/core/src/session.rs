//! Explicit session context handed to every core operation.
//!
//! The HTTP layer resolves the request's token into a [`SessionContext`] and
//! passes it down; nothing in the core reads ambient session state.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::Matricula;

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub matricula: Matricula,
    pub role: Role,
}

/// Who (if anyone) issued the current request.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    operator: Option<Operator>,
}

impl SessionContext {
    pub fn authenticated(matricula: impl Into<Matricula>, role: Role) -> Self {
        Self {
            operator: Some(Operator {
                matricula: matricula.into(),
                role,
            }),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn current_operator_id(&self) -> Option<&str> {
        self.operator.as_ref().map(|op| op.matricula.as_str())
    }

    pub fn current_role(&self) -> Option<Role> {
        self.operator.as_ref().map(|op| op.role)
    }

    /// The operator, or `Unauthorized` when the request carries no session.
    pub fn require_operator(&self) -> Result<&Operator, CoreError> {
        self.operator
            .as_ref()
            .ok_or_else(|| CoreError::Unauthorized("No authenticated operator".into()))
    }

    /// The operator if they hold the administrator role.
    pub fn require_admin(&self) -> Result<&Operator, CoreError> {
        let operator = self.require_operator()?;
        if !operator.role.is_admin() {
            return Err(CoreError::Forbidden("Administrator role required".into()));
        }
        Ok(operator)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn anonymous_session_is_unauthorized() {
        let session = SessionContext::anonymous();
        assert!(session.current_operator_id().is_none());
        assert!(session.current_role().is_none());
        assert_matches!(session.require_operator(), Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn operator_cannot_act_as_admin() {
        let session = SessionContext::authenticated("000123", Role::Operator);
        assert_eq!(session.current_operator_id(), Some("000123"));
        assert_matches!(session.require_admin(), Err(CoreError::Forbidden(_)));
    }

    #[test]
    fn admin_passes_admin_gate() {
        let session = SessionContext::authenticated("002971", Role::Administrator);
        let op = session.require_admin().unwrap();
        assert_eq!(op.matricula, "002971");
    }
}
