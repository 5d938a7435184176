//! 数据库连接管理模块
//!
//! 提供主从两组 PostgreSQL 连接池：写操作走 master，只读查询走 replica。
//! 两个连接池都是长生命周期的共享句柄，可被并发请求安全复用。

use crate::config::{DatabaseConfig, PoolConfig};
use crate::error::{InfraError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// 主从连接池
///
/// 未配置 replica 时两个句柄指向同一个连接池。
/// replica 可能存在复制延迟，调用方需要容忍读到稍旧的数据。
#[derive(Clone, Debug)]
pub struct DbConnections {
    master: PgPool,
    replica: PgPool,
}

impl DbConnections {
    /// 读写共用同一个连接池
    pub fn single(pool: PgPool) -> Self {
        Self {
            master: pool.clone(),
            replica: pool,
        }
    }

    /// 按配置建立主从连接池
    ///
    /// replica 连接失败时会先关闭已建立的 master 连接池再返回错误。
    #[instrument(skip(config))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Initializing database connections...");

        let master = connect_pool(&config.master, "master").await?;

        let replica = match &config.replica {
            Some(replica_config) => match connect_pool(replica_config, "replica").await {
                Ok(pool) => pool,
                Err(e) => {
                    master.close().await;
                    return Err(e);
                }
            },
            None => {
                warn!("No replica configured, read queries will use the master pool");
                master.clone()
            }
        };

        info!("Database connections initialized successfully");

        Ok(Self { master, replica })
    }

    /// 写连接池
    pub fn master(&self) -> &PgPool {
        &self.master
    }

    /// 读连接池
    pub fn replica(&self) -> &PgPool {
        &self.replica
    }

    /// 健康检查：依次探测 master 和 replica
    pub async fn health_check(&self) -> Result<()> {
        ping(&self.master, "master").await?;
        ping(&self.replica, "replica").await
    }

    /// 关闭连接池
    pub async fn close(&self) {
        self.master.close().await;
        self.replica.close().await;
        info!("Database connection pools closed");
    }
}

/// 建立单个端点的连接池
async fn connect_pool(config: &PoolConfig, role: &'static str) -> Result<PgPool> {
    info!(role, "Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
        .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
        .connect(&config.url)
        .await
        .map_err(|source| InfraError::Connect { role, source })?;

    info!(
        role,
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        max_lifetime_seconds = config.max_lifetime_seconds,
        "Database connection pool created"
    );

    Ok(pool)
}

async fn ping(pool: &PgPool, role: &'static str) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|source| InfraError::HealthCheck { role, source })
}
