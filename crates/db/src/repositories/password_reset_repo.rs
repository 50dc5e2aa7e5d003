//! Read access to the `redefinicoes_senha` log.
//!
//! Rows are written by [`super::UserRepo`] in the same transaction as the
//! password change.

use sqlx::PgPool;

use crate::models::password_reset::PasswordReset;

pub struct PasswordResetRepo;

impl PasswordResetRepo {
    /// Password resets of one user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        matricula: &str,
    ) -> Result<Vec<PasswordReset>, sqlx::Error> {
        sqlx::query_as::<_, PasswordReset>(
            "SELECT id, matricula, requisitado_em AS requested_at, requisitado_por AS requested_by
             FROM redefinicoes_senha
             WHERE matricula = $1
             ORDER BY requisitado_em DESC, id DESC",
        )
        .bind(matricula)
        .fetch_all(pool)
        .await
    }
}
