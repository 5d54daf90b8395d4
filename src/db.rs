//! Database connection and pool management.
//!
//! The job talks to four databases: three read-only operational sources and the
//! analytical warehouse. Each gets its own SeaORM connection pool built from the
//! shared pool settings in [`AppConfig`].

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to {name} database: {source}")]
    ConnectionFailed {
        name: &'static str,
        #[source]
        source: sea_orm::DbErr,
    },
    #[error("Invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Read-only operational databases the monitoring events are enriched from.
#[derive(Clone, Debug)]
pub struct SourceConnections {
    /// Finishing/Printing: `monitoringevent`, `Machine`, `MachineEvents`.
    pub finishing_printing: Arc<DatabaseConnection>,
    /// Core: `divisions`, `Buyers`.
    pub core: Arc<DatabaseConnection>,
    /// Sales: `ProductionOrder`.
    pub sales: Arc<DatabaseConnection>,
}

/// All pools a pipeline run needs.
#[derive(Clone, Debug)]
pub struct Connections {
    pub sources: SourceConnections,
    pub warehouse: Arc<DatabaseConnection>,
}

/// Opens one named connection pool.
///
/// No retry is attempted here; a failed connection fails the run and the
/// invoking trigger decides whether to try again.
pub async fn init_pool(
    name: &'static str,
    url: &str,
    cfg: &AppConfig,
) -> Result<DatabaseConnection, DatabaseError> {
    if url.trim().is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: format!("{name} database URL cannot be empty"),
        });
    }

    let mut opt = ConnectOptions::new(url);
    opt.max_connections(cfg.db_max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600)) // 10 minutes
        .max_lifetime(Duration::from_secs(1800)) // 30 minutes
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let conn = Database::connect(opt)
        .await
        .map_err(|source| DatabaseError::ConnectionFailed { name, source })?;
    log::info!("Connected to {} database", name);
    Ok(conn)
}

/// Opens every pool the pipeline needs.
pub async fn connect_all(cfg: &AppConfig) -> Result<Connections, DatabaseError> {
    let (finishing_printing, core, sales, warehouse) = tokio::try_join!(
        init_pool("finishing-printing", &cfg.fp_database_url, cfg),
        init_pool("core", &cfg.core_database_url, cfg),
        init_pool("sales", &cfg.sales_database_url, cfg),
        init_pool("warehouse", &cfg.dwh_database_url, cfg),
    )?;

    Ok(Connections {
        sources: SourceConnections {
            finishing_printing: Arc::new(finishing_printing),
            core: Arc::new(core),
            sales: Arc::new(sales),
        },
        warehouse: Arc::new(warehouse),
    })
}

/// Health check for a database connection.
pub async fn health_check(db: &DatabaseConnection) -> Result<()> {
    let stmt = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());

    db.query_one(stmt)
        .await
        .context("Database health check failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_database_url() {
        let config = AppConfig::default();

        let result = init_pool("warehouse", "", &config).await;

        assert!(matches!(
            result,
            Err(DatabaseError::InvalidConfiguration { .. })
        ));
    }

    #[tokio::test]
    async fn test_health_check_on_sqlite() {
        let config = AppConfig::default();
        let db = init_pool("core", "sqlite::memory:", &config)
            .await
            .expect("sqlite connects");

        health_check(&db).await.expect("healthy");
    }
}
