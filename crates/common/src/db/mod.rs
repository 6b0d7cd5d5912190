//! Database layer for the catalog
//!
//! Provides:
//! - SeaORM entity models
//! - Entity type resolution
//! - Repository pattern for data access
//! - Connection pool management and schema bootstrap

pub mod descriptor;
pub mod models;
mod repository;

pub use descriptor::{EntityDescriptor, KeyShape};
pub use repository::{
    BaseRepository, ContentRepository, EntityOf, KeyOf, ModelOf, Repository, SourceKey,
    SourceRepository,
};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use models::{ContentEntity, SourceEntity};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone, Debug)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");
        let primary = connect(&config.url, config)
            .await
            .map_err(|e| AppError::Unavailable {
                message: format!("Failed to connect to primary: {}", e),
            })?;

        // Connect to replica if configured
        let replica = match config.read_url {
            Some(ref read_url) => {
                info!("Connecting to read replica...");
                let conn = connect(read_url, config)
                    .await
                    .map_err(|e| AppError::Unavailable {
                        message: format!("Failed to connect to replica: {}", e),
                    })?;
                Some(conn)
            }
            None => None,
        };

        info!("Database connections established");
        Ok(Self { primary, replica })
    }

    /// Get the connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    /// Get the connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary.ping().await.map_err(|e| AppError::Unavailable {
            message: format!("Primary ping failed: {}", e),
        })?;

        if let Some(ref replica) = self.replica {
            replica.ping().await.map_err(|e| AppError::Unavailable {
                message: format!("Replica ping failed: {}", e),
            })?;
        }

        Ok(())
    }
}

async fn connect(url: &str, config: &DatabaseConfig) -> std::result::Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(config.sqlx_logging);

    Database::connect(opts).await
}

/// Create the catalog tables on the primary if they do not exist yet.
///
/// Tables are derived from the entity definitions, so the source table
/// carries its composite key and the cascading foreign key to content.
pub async fn create_schema(pool: &DbPool) -> Result<()> {
    let db = pool.write();
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut content = schema.create_table_from_entity(ContentEntity);
    db.execute(backend.build(content.if_not_exists())).await?;

    let mut source = schema.create_table_from_entity(SourceEntity);
    db.execute(backend.build(source.if_not_exists())).await?;

    info!("Catalog schema ready");
    Ok(())
}

/// Fresh in-memory store with the catalog schema
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = DbPool::new(&DatabaseConfig::in_memory()).await.unwrap();
    create_schema(&pool).await.unwrap();
    pool
}
