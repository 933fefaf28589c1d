//! 数据库连接管理
//! 进程生命周期内只持有一条 PostgreSQL 连接

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use secrecy::ExposeSecret;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::time::Duration;

/// 根据配置生成连接参数
pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.name)
        .username(&config.user)
        .password(config.password.expose_secret())
}

/// 建立数据库连接（单连接，无连接复用）
///
/// 连接失败立即返回错误，不做重试。
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    tracing::debug!(
        host = %config.host,
        port = config.port,
        database = %config.name,
        "Connecting to database..."
    );

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(connect_options(config))
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            StoreError::Connect(e.to_string())
        })?;

    tracing::info!(
        host = %config.host,
        database = %config.name,
        "Database connection established"
    );

    Ok(pool)
}
