//! PostgreSQL pool construction and schema migrations.

pub mod repository;

use deadpool_postgres::{Config, Pool, Runtime};
use tokio_postgres::NoTls;

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;

mod embedded {
    refinery::embed_migrations!("migrations");
}

/// Build a connection pool and verify one connection can be acquired.
pub async fn connect(config: &DatabaseConfig) -> Result<Pool, DatabaseError> {
    let mut cfg = Config::new();
    cfg.url = Some(config.url().to_string());
    cfg.pool = Some(deadpool_postgres::PoolConfig {
        max_size: config.pool_size,
        ..Default::default()
    });

    let pool = cfg
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| DatabaseError::Pool(e.to_string()))?;

    // Test connection
    let _ = pool.get().await?;

    Ok(pool)
}

/// Apply embedded migrations over a dedicated connection.
pub async fn run_migrations(config: &DatabaseConfig) -> Result<(), DatabaseError> {
    let (mut client, connection) = tokio_postgres::connect(config.url(), NoTls).await?;
    let driver = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("migration connection error: {}", e);
        }
    });

    let report = embedded::migrations::runner().run_async(&mut client).await?;
    for migration in report.applied_migrations() {
        tracing::info!("applied migration {}", migration);
    }

    drop(client);
    let _ = driver.await;

    Ok(())
}
