//! Request handlers.
//!
//! Each submodule groups the handlers of one resource. Handlers delegate
//! decisions to `shopfloor_core`, persistence to `shopfloor_db`, and map
//! errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod import;
pub mod machines;
pub mod production;
pub mod users;

use shopfloor_core::accounts::ensure_unreferenced;
use shopfloor_core::error::CoreError;
use shopfloor_db::repositories::DeleteOutcome;

use crate::error::AppResult;

/// Turn a guarded delete's outcome into a handler result.
pub(crate) fn ensure_deleted(
    entity: &'static str,
    id: &str,
    outcome: DeleteOutcome,
) -> AppResult<()> {
    match outcome {
        DeleteOutcome::Deleted => Ok(()),
        DeleteOutcome::NotFound => Err(CoreError::not_found(entity, id).into()),
        DeleteOutcome::Referenced(dependents) => {
            Ok(ensure_unreferenced(entity, id, dependents)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn unreferenced_delete_succeeds() {
        assert!(ensure_deleted("User", "000123", DeleteOutcome::Deleted).is_ok());
    }

    #[test]
    fn referenced_delete_is_refused() {
        assert_matches!(
            ensure_deleted("User", "000123", DeleteOutcome::Referenced(4)),
            Err(AppError::Core(CoreError::ReferentialIntegrity { entity: "User", dependents: 4, .. }))
        );
    }

    #[test]
    fn missing_row_is_not_found() {
        assert_matches!(
            ensure_deleted("Machine", "M9", DeleteOutcome::NotFound),
            Err(AppError::Core(CoreError::NotFound { entity: "Machine", .. }))
        );
    }
}
