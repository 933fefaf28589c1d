//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::Secret;
use serde::Deserialize;

/// 消息删除时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// 收到即删除（默认行为，写库失败时消息会丢失）
    OnReceipt,
    /// 行提交成功（或事件被丢弃）后再删除，写库失败时消息会被重新投递
    AfterWrite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// AWS 区域，例如 "us-east-1"
    pub region: String,
    /// 自定义端点（LocalStack 等），为空表示使用 AWS 默认端点
    pub endpoint_url: Option<String>,
    /// 队列 URL
    pub queue_url: String,
    /// 长轮询等待时间（秒，0-20），0 表示立即返回
    pub wait_time_seconds: i32,
    /// 消息删除时机
    pub delete_policy: DeletePolicy,
    /// 显式访问密钥（可选，未设置时使用默认凭证链）
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<Secret<String>>,
}

impl QueueConfig {
    /// 有效的自定义端点（空字符串视为未设置）
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint_url.as_deref().filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库主机
    pub host: String,
    /// 端口
    pub port: u16,
    /// 数据库名
    pub name: String,
    /// 用户名
    pub user: String,
    /// 密码（使用 Secret 包装，防止日志泄露）
    pub password: Secret<String>,
    /// 目标表名
    pub table: String,
    /// 建立连接超时时间（秒）
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub queue: QueueConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 默认值对应本地测试环境（LocalStack + PostgreSQL）
        settings = settings
            .set_default("queue.region", "us-east-1")?
            .set_default("queue.endpoint_url", "http://localhost:4566")?
            .set_default(
                "queue.queue_url",
                "http://localhost:4566/000000000000/login-queue",
            )?
            .set_default("queue.wait_time_seconds", 0)?
            .set_default("queue.delete_policy", "on_receipt")?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.name", "postgres")?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.table", "user_logins")?
            .set_default("database.connect_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?;

        // 从环境变量加载配置（前缀为 LOGIN_ETL_）
        // 值保持字符串，数值字段在反序列化时转换，密码等不会丢失前导零
        settings = settings.add_source(
            Environment::with_prefix("LOGIN_ETL")
                .prefix_separator("_")
                .separator("__"),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.queue.queue_url.trim().is_empty() {
            return Err(ConfigError::Message("queue_url must not be empty".to_string()));
        }

        // SQS 长轮询上限为 20 秒
        if !(0..=20).contains(&self.queue.wait_time_seconds) {
            return Err(ConfigError::Message(
                "wait_time_seconds must be between 0 and 20".to_string(),
            ));
        }

        if self.queue.access_key_id.is_some() != self.queue.secret_access_key.is_some() {
            return Err(ConfigError::Message(
                "access_key_id and secret_access_key must be set together".to_string(),
            ));
        }

        if self.database.port == 0 {
            return Err(ConfigError::Message("Database port must not be 0".to_string()));
        }

        if self.database.table.trim().is_empty() {
            return Err(ConfigError::Message("Target table must not be empty".to_string()));
        }

        Ok(())
    }
}
