//! Repository for the `atividades` table.
//!
//! Opening and closing runs goes through [`crate::PgProductionStore`]; this
//! repository covers history reads and legacy import.

use shopfloor_core::legacy::ImportedRun;
use sqlx::PgPool;

use crate::models::run::Run;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id_atividade AS id, id_maquina AS machine_id, \
                        inicio AS started_at, fim AS ended_at, \
                        operador_inicio AS start_operator, operador_fim AS end_operator, \
                        ciclos_realizados AS cycle_count, tempo_total_segundos AS total_seconds, \
                        tempo_medio_ciclo AS average_cycle_seconds";

pub struct RunRepo;

impl RunRepo {
    /// Most recent runs of a machine, newest first.
    pub async fn list_recent_for_machine(
        pool: &PgPool,
        machine_id: &str,
        limit: i64,
    ) -> Result<Vec<Run>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM atividades
             WHERE id_maquina = $1
             ORDER BY inicio DESC, id_atividade DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(machine_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Insert converted legacy rows in one transaction.
    ///
    /// A row that would leave two open runs on a machine violates
    /// `uq_atividades_open` and rolls back the whole batch.
    pub async fn import_batch(
        pool: &PgPool,
        rows: &[ImportedRun],
    ) -> Result<Vec<Run>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(rows.len());

        let query = format!(
            "INSERT INTO atividades
                (id_maquina, inicio, fim, operador_inicio, operador_fim,
                 ciclos_realizados, tempo_total_segundos, tempo_medio_ciclo)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );

        for row in rows {
            let run = sqlx::query_as::<_, Run>(&query)
                .bind(&row.machine_id)
                .bind(row.started_at)
                .bind(row.ended_at)
                .bind(&row.start_operator)
                .bind(&row.end_operator)
                .bind(row.cycle_count)
                .bind(row.total_seconds)
                .bind(row.average_cycle_seconds)
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(run);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
