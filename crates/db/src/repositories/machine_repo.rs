//! Repository for the `maquinas` table.

use sqlx::PgPool;

use crate::models::machine::{CreateMachine, Machine, SectorMachine, UpdateMachine};
use crate::repositories::DeleteOutcome;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id_maquina AS id, nome_maquina AS name, setor AS sector, \
                        tipo_maquina AS machine_type, meta_hora AS hourly_target, \
                        meta_dia AS daily_target, status, created_at, created_by, \
                        updated_at, updated_by";

/// Provides CRUD operations for machines.
///
/// `status` is never written here; only the production store updates it.
pub struct MachineRepo;

impl MachineRepo {
    /// Insert a new machine, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMachine) -> Result<Machine, sqlx::Error> {
        let query = format!(
            "INSERT INTO maquinas
                (id_maquina, nome_maquina, setor, tipo_maquina, meta_hora, meta_dia, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Machine>(&query)
            .bind(&input.id)
            .bind(&input.name)
            .bind(&input.sector)
            .bind(&input.machine_type)
            .bind(input.hourly_target)
            .bind(input.daily_target)
            .bind(&input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Machine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM maquinas WHERE id_maquina = $1");
        sqlx::query_as::<_, Machine>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM maquinas WHERE id_maquina = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// List all machines ordered by sector, then name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Machine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM maquinas ORDER BY setor, nome_maquina");
        sqlx::query_as::<_, Machine>(&query).fetch_all(pool).await
    }

    /// Every machine's sector, id and name, ordered for grouping by sector.
    pub async fn list_by_sector(pool: &PgPool) -> Result<Vec<SectorMachine>, sqlx::Error> {
        sqlx::query_as::<_, SectorMachine>(
            "SELECT setor AS sector, id_maquina AS id, nome_maquina AS name
             FROM maquinas
             ORDER BY setor, nome_maquina",
        )
        .fetch_all(pool)
        .await
    }

    /// Update machine metadata. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateMachine,
    ) -> Result<Option<Machine>, sqlx::Error> {
        let query = format!(
            "UPDATE maquinas SET
                nome_maquina = COALESCE($2, nome_maquina),
                setor = COALESCE($3, setor),
                tipo_maquina = COALESCE($4, tipo_maquina),
                meta_hora = COALESCE($5, meta_hora),
                meta_dia = COALESCE($6, meta_dia),
                updated_at = NOW(),
                updated_by = $7
             WHERE id_maquina = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Machine>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.sector)
            .bind(&input.machine_type)
            .bind(input.hourly_target)
            .bind(input.daily_target)
            .bind(&input.updated_by)
            .fetch_optional(pool)
            .await
    }

    /// Delete a machine unless any run or stoppage references it.
    ///
    /// The machine row is locked with the same `FOR UPDATE` the production
    /// store takes, so a transition cannot slip in between count and delete.
    pub async fn delete_if_unreferenced(
        pool: &PgPool,
        id: &str,
    ) -> Result<DeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let locked: Option<String> =
            sqlx::query_scalar("SELECT id_maquina FROM maquinas WHERE id_maquina = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let references: i64 = sqlx::query_scalar(
            "SELECT
                (SELECT COUNT(*) FROM atividades WHERE id_maquina = $1)
              + (SELECT COUNT(*) FROM paradas WHERE id_maquina = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if references > 0 {
            return Ok(DeleteOutcome::Referenced(references));
        }

        sqlx::query("DELETE FROM maquinas WHERE id_maquina = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }
}
