//! 统一错误模型
//! 定义各组件的错误类型，以及流水线层面的致命错误

use thiserror::Error;

/// 队列客户端错误
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to receive message: {0}")]
    Receive(String),

    #[error("Failed to delete message: {0}")]
    Delete(String),

    #[error("Malformed message body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("Message has no body")]
    MissingBody,

    #[error("Message has no receipt handle")]
    MissingReceiptHandle,
}

/// 关系存储客户端错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    Connect(String),

    #[error("Write failed: {0}")]
    Write(#[from] sqlx::Error),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Row has no columns")]
    EmptyRow,
}

/// 事件校验错误（不会向上传播，事件被丢弃）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Message body is not a JSON object")]
    NotAnObject,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Field {0} is not a string")]
    InvalidFieldType(&'static str),
}

/// 流水线致命错误
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// 结构化日志使用的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::Queue(QueueError::MalformedBody(_) | QueueError::MissingBody) => {
                "malformed_message"
            }
            EtlError::Queue(_) => "queue_transport",
            EtlError::Store(StoreError::Connect(_)) => "store_connect",
            EtlError::Store(StoreError::Write(_)) => "store_write",
            EtlError::Store(_) => "store_statement",
            EtlError::Config(_) => "config",
        }
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for EtlError {
    fn from(e: config::ConfigError) -> Self {
        EtlError::Config(e.to_string())
    }
}
