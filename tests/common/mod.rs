//! 测试公共模块
//! 提供内存队列与记录型存储，替代 SQS 与 PostgreSQL

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use login_etl::{
    config::DeletePolicy,
    error::{QueueError, StoreError},
    models::TableRow,
    queue::{settle_received, MessageQueue, QueueMessage},
    repository::RowStore,
    services::{transform::FixedClock, LoginEtlService},
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub const TABLE: &str = "user_logins";

/// 测试使用的固定日期
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// 内存队列，消息体保存为原始字符串，删除策略与 SqsQueue 一致
pub struct InMemoryQueue {
    pending: Mutex<VecDeque<String>>,
    deleted: Mutex<Vec<String>>,
    policy: DeletePolicy,
    next_receipt: AtomicU64,
    receive_calls: AtomicU64,
    /// 队列取空时取消，用于让 run() 结束
    drained: Option<CancellationToken>,
}

impl InMemoryQueue {
    pub fn new(bodies: &[&str], policy: DeletePolicy) -> Self {
        Self {
            pending: Mutex::new(bodies.iter().map(|b| b.to_string()).collect()),
            deleted: Mutex::new(Vec::new()),
            policy,
            next_receipt: AtomicU64::new(0),
            receive_calls: AtomicU64::new(0),
            drained: None,
        }
    }

    pub fn cancel_when_drained(mut self, token: CancellationToken) -> Self {
        self.drained = Some(token);
        self
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn receive_calls(&self) -> u64 {
        self.receive_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn receive_next(&self) -> Result<Option<QueueMessage>, QueueError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.pending.lock().unwrap().pop_front();
        let Some(raw) = next else {
            if let Some(token) = &self.drained {
                token.cancel();
            }
            return Ok(None);
        };

        let receipt_handle = format!(
            "receipt-{}",
            self.next_receipt.fetch_add(1, Ordering::SeqCst)
        );

        // 与 SqsQueue 使用同一套删除决策
        let received = settle_received(self.policy, Some(&receipt_handle), Some(&raw));
        if let Some(receipt_handle) = &received.delete {
            self.delete(receipt_handle).await?;
        }
        received.result.map(Some)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.deleted.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }
}

/// 记录所有写入的存储
#[derive(Default)]
pub struct RecordingStore {
    rows: Mutex<Vec<(String, TableRow)>>,
    fail: AtomicBool,
}

impl RecordingStore {
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub fn rows(&self) -> Vec<(String, TableRow)> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowStore for RecordingStore {
    async fn write(&self, table: &str, row: &TableRow) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Write(sqlx::Error::Protocol(
                "null value in column \"locale\" violates not-null constraint".to_string(),
            )));
        }
        self.rows
            .lock()
            .unwrap()
            .push((table.to_string(), row.clone()));
        Ok(())
    }
}

/// 创建使用固定日期的服务
pub fn create_service(queue: Arc<InMemoryQueue>, store: Arc<RecordingStore>) -> LoginEtlService {
    LoginEtlService::new(queue, store, TABLE).with_clock(Arc::new(FixedClock(test_date())))
}
