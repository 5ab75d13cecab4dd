use std::sync::Arc;
use std::time::Duration;

use application::{MessageRepository, ParticipantRepository};
use config::DatabaseConfig;
use sqlx::PgPool;
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    repository::{create_pg_pool, PgMessageRepository, PgParticipantRepository},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database url is not configured")]
    MissingDatabaseUrl,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 基于 PostgreSQL 的持久化网关
#[derive(Clone)]
pub struct Infrastructure {
    pub pool: PgPool,
    pub participant_repository: Arc<PgParticipantRepository>,
    pub message_repository: Arc<PgMessageRepository>,
}

impl Infrastructure {
    /// 建立连接池并执行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, InfrastructureError> {
        let url = config
            .url
            .as_deref()
            .ok_or(InfrastructureError::MissingDatabaseUrl)?;
        let pool = create_pg_pool(
            url,
            config.max_connections,
            Duration::from_secs(config.acquire_timeout_secs),
        )
        .await?;
        MIGRATOR.run(&pool).await?;

        tracing::info!("database migrations applied");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            participant_repository: Arc::new(PgParticipantRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            pool,
        }
    }

    pub fn participant_repository_trait(&self) -> Arc<dyn ParticipantRepository> {
        self.participant_repository.clone()
    }

    pub fn message_repository_trait(&self) -> Arc<dyn MessageRepository> {
        self.message_repository.clone()
    }
}
