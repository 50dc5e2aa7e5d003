//! Repository for the `usuarios` table.

use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::DeleteOutcome;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "matricula, nome AS name, senha_hash AS password_hash, perfil AS role, \
                        created_at, created_by, updated_at, updated_by";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO usuarios (matricula, nome, senha_hash, perfil, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.matricula)
            .bind(&input.name)
            .bind(&input.password_hash)
            .bind(input.role.as_str())
            .bind(&input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_matricula(
        pool: &PgPool,
        matricula: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM usuarios WHERE matricula = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(matricula)
            .fetch_optional(pool)
            .await
    }

    /// List all users ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM usuarios ORDER BY nome, matricula");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM usuarios")
            .fetch_one(pool)
            .await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// A new password hash also records a row in `redefinicoes_senha`, in the
    /// same transaction. Returns `None` if no user has the given matricula.
    pub async fn update(
        pool: &PgPool,
        matricula: &str,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE usuarios SET
                nome = COALESCE($2, nome),
                perfil = COALESCE($3, perfil),
                senha_hash = COALESCE($4, senha_hash),
                updated_at = NOW(),
                updated_by = $5
             WHERE matricula = $1
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(matricula)
            .bind(&input.name)
            .bind(input.role.map(|r| r.as_str()))
            .bind(&input.password_hash)
            .bind(&input.updated_by)
            .fetch_optional(&mut *tx)
            .await?;

        if user.is_some() && input.password_hash.is_some() {
            sqlx::query(
                "INSERT INTO redefinicoes_senha (matricula, requisitado_por) VALUES ($1, $2)",
            )
            .bind(matricula)
            .bind(&input.updated_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    /// Replace a user's password hash and log the reset.
    ///
    /// `requested_by` is the administrator forcing the reset, or `None` when
    /// users change their own password. Returns `false` if the user does not
    /// exist.
    pub async fn reset_password(
        pool: &PgPool,
        matricula: &str,
        password_hash: &str,
        requested_by: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let result = sqlx::query(
            "UPDATE usuarios SET senha_hash = $2, updated_at = NOW(), \
             updated_by = COALESCE($3, matricula) WHERE matricula = $1",
        )
        .bind(matricula)
        .bind(password_hash)
        .bind(requested_by)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO redefinicoes_senha (matricula, requisitado_por) VALUES ($1, $2)")
            .bind(matricula)
            .bind(requested_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Delete a user unless history rows reference them.
    ///
    /// The user row is locked first so no run or stoppage can start
    /// referencing it between the count and the delete.
    pub async fn delete_if_unreferenced(
        pool: &PgPool,
        matricula: &str,
    ) -> Result<DeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let locked: Option<String> =
            sqlx::query_scalar("SELECT matricula FROM usuarios WHERE matricula = $1 FOR UPDATE")
                .bind(matricula)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let references: i64 = sqlx::query_scalar(COUNT_REFERENCES)
            .bind(matricula)
            .fetch_one(&mut *tx)
            .await?;
        if references > 0 {
            return Ok(DeleteOutcome::Referenced(references));
        }

        sqlx::query("DELETE FROM usuarios WHERE matricula = $1")
            .bind(matricula)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }
}

const COUNT_REFERENCES: &str = "SELECT
        (SELECT COUNT(*) FROM atividades WHERE operador_inicio = $1 OR operador_fim = $1)
      + (SELECT COUNT(*) FROM paradas WHERE operador_inicio = $1 OR operador_fim = $1)";
