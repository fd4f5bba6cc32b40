use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr};
use std::path::Path;
use tracing::info;

use crate::config::GeneralConfig;
use crate::constants;
use crate::domain::UserId;

pub mod migrator;
pub mod repositories;

pub use repositories::user::UserRepository;

/// Records owned by the application shell that reference a user row.
///
/// `purge` runs inside the same transaction that removes the user, so either
/// both the dependents and the user disappear or neither does.
#[async_trait]
pub trait DependentRecords: Send + Sync {
    async fn purge(&self, txn: &DatabaseTransaction, user_id: UserId) -> Result<(), DbErr>;
}

/// For shells that keep no per-user records.
pub struct NoDependents;

#[async_trait]
impl DependentRecords for NoDependents {
    async fn purge(&self, _txn: &DatabaseTransaction, _user_id: UserId) -> Result<(), DbErr> {
        Ok(())
    }
}

/// Explicit storage handle. Built once at startup and handed to the services
/// that need it; each repository call acquires a pooled connection for the
/// duration of one transaction.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn from_config(config: &GeneralConfig) -> Result<Self> {
        Self::with_pool_options(
            &config.database_path,
            config.max_db_connections,
            config.min_db_connections,
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(constants::db::CONNECT_TIMEOUT)
            .acquire_timeout(constants::db::ACQUIRE_TIMEOUT)
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    #[must_use]
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }
}
