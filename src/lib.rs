//! 登录事件 ETL 服务库
//! 从 SQS 读取登录事件，脱敏转换后写入 PostgreSQL

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod repository;
pub mod services;
pub mod telemetry;
