//! Rules for administering users and machines.

use crate::error::CoreError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Check a new password against its confirmation and the length floor.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), CoreError> {
    if password != confirmation {
        return Err(CoreError::Validation(
            "Password and confirmation do not match".into(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

/// Refuse an administrator deleting their own account.
pub fn ensure_not_self(actor: &str, target: &str) -> Result<(), CoreError> {
    if actor == target {
        return Err(CoreError::Forbidden(
            "You cannot delete your own account".into(),
        ));
    }
    Ok(())
}

/// Refuse a delete while history rows still point at the entity.
pub fn ensure_unreferenced(
    entity: &'static str,
    id: &str,
    dependents: i64,
) -> Result<(), CoreError> {
    if dependents > 0 {
        return Err(CoreError::ReferentialIntegrity {
            entity,
            id: id.to_string(),
            dependents,
        });
    }
    Ok(())
}

/// Trimmed, non-empty identifier or `Validation`.
pub fn require_identifier<'a>(field: &str, raw: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn mismatched_confirmation_rejected() {
        assert_matches!(
            validate_new_password("segredo1", "segredo2"),
            Err(CoreError::Validation(msg)) if msg.contains("do not match")
        );
    }

    #[test]
    fn short_password_rejected() {
        assert_matches!(
            validate_new_password("abc", "abc"),
            Err(CoreError::Validation(_))
        );
        assert!(validate_new_password("abcdef", "abcdef").is_ok());
    }

    #[test]
    fn self_delete_forbidden() {
        assert_matches!(
            ensure_not_self("000123", "000123"),
            Err(CoreError::Forbidden(_))
        );
        assert!(ensure_not_self("000123", "000456").is_ok());
    }

    #[test]
    fn referenced_entity_blocked() {
        assert!(ensure_unreferenced("User", "000123", 0).is_ok());
        assert_matches!(
            ensure_unreferenced("User", "000123", 3),
            Err(CoreError::ReferentialIntegrity { dependents: 3, .. })
        );
    }

    #[test]
    fn blank_identifier_rejected() {
        assert_eq!(require_identifier("Matricula", " 42 ").unwrap(), "42");
        assert_matches!(
            require_identifier("Matricula", "   "),
            Err(CoreError::Validation(_))
        );
    }
}
