//! First-run administrator.

use shopfloor_core::accounts::{require_identifier, validate_new_password};
use shopfloor_core::roles::Role;
use shopfloor_db::models::user::CreateUser;
use shopfloor_db::repositories::UserRepo;
use shopfloor_db::DbPool;

use crate::auth::password::hash_for_storage;
use crate::config::BootstrapAdmin;
use crate::error::AppResult;

/// Create the configured administrator if the user table is empty.
///
/// Returns `true` when an account was created.
pub async fn ensure_bootstrap_admin(pool: &DbPool, admin: &BootstrapAdmin) -> AppResult<bool> {
    if UserRepo::count(pool).await? > 0 {
        return Ok(false);
    }
    validate_new_password(&admin.password, &admin.password)?;

    UserRepo::create(
        pool,
        &CreateUser {
            matricula: require_identifier("Matricula", &admin.matricula)?.to_string(),
            name: require_identifier("Name", &admin.name)?.to_string(),
            password_hash: hash_for_storage(&admin.password)?,
            role: Role::Administrator,
            created_by: None,
        },
    )
    .await?;

    tracing::info!(matricula = %admin.matricula, "Bootstrap administrator created");
    Ok(true)
}
