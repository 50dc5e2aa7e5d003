use std::sync::Arc;

use shopfloor_core::production::ProductionEngine;
use shopfloor_db::PgProductionStore;

use crate::config::ServerConfig;

/// The production engine as wired to Postgres.
pub type Engine = ProductionEngine<PgProductionStore>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and the rest is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: shopfloor_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub engine: Arc<Engine>,
}

impl AppState {
    /// Build the state, wiring a production engine onto `pool` with the
    /// configured category catalog.
    pub fn new(pool: shopfloor_db::DbPool, config: ServerConfig) -> Self {
        let engine = ProductionEngine::new(
            PgProductionStore::new(pool.clone()),
            config.production.categories.clone(),
        );
        Self {
            pool,
            config: Arc::new(config),
            engine: Arc::new(engine),
        }
    }
}
