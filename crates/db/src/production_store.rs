//! Postgres implementation of the production store contract.
//!
//! A machine is locked with `SELECT ... FOR UPDATE` on its `maquinas` row.
//! The lock lives as long as the transaction, so concurrent transitions on
//! the same machine queue behind each other while other machines proceed.

use shopfloor_core::category::StoppageCategory;
use shopfloor_core::error::CoreError;
use shopfloor_core::production::store::{
    MachineTx, NewRun, NewStoppage, OpenRun, OpenStoppage, ProductionStore, RunClosure,
    StoppageClosure,
};
use shopfloor_core::types::{DbId, MachineId, Matricula, Timestamp};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::StoreError;

#[derive(Debug, Clone)]
pub struct PgProductionStore {
    pool: PgPool,
}

impl PgProductionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProductionStore for PgProductionStore {
    type Error = StoreError;
    type Tx = PgMachineTx;

    async fn lock_machine(&self, machine_id: &str) -> Result<PgMachineTx, StoreError> {
        let mut tx = self.pool.begin().await?;
        let locked: Option<String> =
            sqlx::query_scalar("SELECT id_maquina FROM maquinas WHERE id_maquina = $1 FOR UPDATE")
                .bind(machine_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(CoreError::not_found("Machine", machine_id).into());
        }
        tracing::trace!(machine_id, "Machine row locked");
        Ok(PgMachineTx {
            tx,
            machine_id: machine_id.to_string(),
        })
    }
}

/// An open transaction holding the row lock on one machine.
pub struct PgMachineTx {
    tx: Transaction<'static, Postgres>,
    machine_id: MachineId,
}

#[derive(FromRow)]
struct OpenRunRow {
    id: DbId,
    started_at: Timestamp,
    start_operator: Matricula,
    cycle_count: Option<i32>,
}

#[derive(FromRow)]
struct OpenStoppageRow {
    id: DbId,
    run_id: Option<DbId>,
    category: String,
    started_at: Timestamp,
    start_operator: Matricula,
}

impl PgMachineTx {
    fn open_stoppage(&self, row: OpenStoppageRow) -> OpenStoppage {
        OpenStoppage {
            id: row.id,
            machine_id: self.machine_id.clone(),
            run_id: row.run_id,
            category: StoppageCategory::from_stored(row.category),
            started_at: row.started_at,
            start_operator: row.start_operator,
        }
    }
}

const OPEN_STOPPAGE_COLUMNS: &str = "id_parada AS id, id_atividade AS run_id, \
                                     tipo_parada AS category, inicio AS started_at, \
                                     operador_inicio AS start_operator";

impl MachineTx for PgMachineTx {
    type Error = StoreError;

    async fn find_open_run(&mut self) -> Result<Option<OpenRun>, StoreError> {
        let row = sqlx::query_as::<_, OpenRunRow>(
            "SELECT id_atividade AS id, inicio AS started_at,
                    operador_inicio AS start_operator, ciclos_realizados AS cycle_count
             FROM atividades
             WHERE id_maquina = $1 AND fim IS NULL",
        )
        .bind(&self.machine_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|r| OpenRun {
            id: r.id,
            machine_id: self.machine_id.clone(),
            started_at: r.started_at,
            start_operator: r.start_operator,
            cycle_count: r.cycle_count,
        }))
    }

    async fn find_open_run_id(&mut self) -> Result<Option<DbId>, StoreError> {
        let id = sqlx::query_scalar(
            "SELECT id_atividade FROM atividades WHERE id_maquina = $1 AND fim IS NULL",
        )
        .bind(&self.machine_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn insert_run(&mut self, run: NewRun) -> Result<DbId, StoreError> {
        let id = sqlx::query_scalar(
            "INSERT INTO atividades (id_maquina, inicio, operador_inicio)
             VALUES ($1, $2, $3)
             RETURNING id_atividade",
        )
        .bind(&self.machine_id)
        .bind(run.started_at)
        .bind(&run.start_operator)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn close_run(&mut self, run_id: DbId, closure: RunClosure) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE atividades SET
                fim = $2,
                operador_fim = $3,
                tempo_total_segundos = $4,
                tempo_medio_ciclo = $5
             WHERE id_atividade = $1 AND fim IS NULL",
        )
        .bind(run_id)
        .bind(closure.ended_at)
        .bind(&closure.end_operator)
        .bind(closure.total_seconds)
        .bind(closure.average_cycle_seconds)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Open run", run_id).into());
        }
        Ok(())
    }

    async fn set_cycle_count(&mut self, run_id: DbId, cycles: i32) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE atividades SET ciclos_realizados = $2
             WHERE id_atividade = $1 AND fim IS NULL",
        )
        .bind(run_id)
        .bind(cycles)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Open run", run_id).into());
        }
        Ok(())
    }

    async fn find_open_stoppage(
        &mut self,
        category: &StoppageCategory,
    ) -> Result<Option<OpenStoppage>, StoreError> {
        let query = format!(
            "SELECT {OPEN_STOPPAGE_COLUMNS} FROM paradas
             WHERE id_maquina = $1 AND tipo_parada = $2 AND fim IS NULL"
        );
        let row = sqlx::query_as::<_, OpenStoppageRow>(&query)
            .bind(&self.machine_id)
            .bind(category.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(|r| self.open_stoppage(r)))
    }

    async fn list_open_stoppages(&mut self) -> Result<Vec<OpenStoppage>, StoreError> {
        let query = format!(
            "SELECT {OPEN_STOPPAGE_COLUMNS} FROM paradas
             WHERE id_maquina = $1 AND fim IS NULL
             ORDER BY inicio, id_parada"
        );
        let rows = sqlx::query_as::<_, OpenStoppageRow>(&query)
            .bind(&self.machine_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(|r| self.open_stoppage(r)).collect())
    }

    async fn insert_stoppage(&mut self, stoppage: NewStoppage) -> Result<DbId, StoreError> {
        let id = sqlx::query_scalar(
            "INSERT INTO paradas (id_maquina, id_atividade, tipo_parada, inicio, operador_inicio)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id_parada",
        )
        .bind(&self.machine_id)
        .bind(stoppage.run_id)
        .bind(stoppage.category.as_str())
        .bind(stoppage.started_at)
        .bind(&stoppage.start_operator)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn close_stoppage(
        &mut self,
        stoppage_id: DbId,
        closure: StoppageClosure,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE paradas SET
                fim = $2,
                operador_fim = $3,
                tempo_total_segundos = $4
             WHERE id_parada = $1 AND fim IS NULL",
        )
        .bind(stoppage_id)
        .bind(closure.ended_at)
        .bind(&closure.end_operator)
        .bind(closure.total_seconds)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Open stoppage", stoppage_id).into());
        }
        Ok(())
    }

    async fn update_machine_status(&mut self, label: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE maquinas SET status = $2 WHERE id_maquina = $1")
            .bind(&self.machine_id)
            .bind(label)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
