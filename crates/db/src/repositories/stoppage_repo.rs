//! Repository for the `paradas` table (history reads and legacy import).

use shopfloor_core::legacy::ImportedStoppage;
use sqlx::PgPool;

use crate::models::stoppage::Stoppage;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id_parada AS id, id_maquina AS machine_id, \
                        id_atividade AS run_id, tipo_parada AS category, \
                        inicio AS started_at, fim AS ended_at, \
                        operador_inicio AS start_operator, operador_fim AS end_operator, \
                        tempo_total_segundos AS total_seconds";

pub struct StoppageRepo;

impl StoppageRepo {
    /// Most recent stoppages of a machine, newest first.
    pub async fn list_recent_for_machine(
        pool: &PgPool,
        machine_id: &str,
        limit: i64,
    ) -> Result<Vec<Stoppage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM paradas
             WHERE id_maquina = $1
             ORDER BY inicio DESC, id_parada DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Stoppage>(&query)
            .bind(machine_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Insert converted legacy rows in one transaction.
    ///
    /// Each stoppage is linked to the run of the same machine that was in
    /// progress when it began, if one exists. A row that would open a second
    /// stoppage of the same category violates `uq_paradas_open`.
    pub async fn import_batch(
        pool: &PgPool,
        rows: &[ImportedStoppage],
    ) -> Result<Vec<Stoppage>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = Vec::with_capacity(rows.len());

        let query = format!(
            "INSERT INTO paradas
                (id_maquina, id_atividade, tipo_parada, inicio, fim,
                 operador_inicio, operador_fim, tempo_total_segundos)
             VALUES (
                $1,
                (SELECT id_atividade FROM atividades
                  WHERE id_maquina = $1 AND inicio <= $3 AND (fim IS NULL OR fim >= $3)
                  ORDER BY inicio DESC
                  LIMIT 1),
                $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );

        for row in rows {
            let stoppage = sqlx::query_as::<_, Stoppage>(&query)
                .bind(&row.machine_id)
                .bind(row.category.as_str())
                .bind(row.started_at)
                .bind(row.ended_at)
                .bind(&row.start_operator)
                .bind(&row.end_operator)
                .bind(row.total_seconds)
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(stoppage);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
