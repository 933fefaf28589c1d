//! 登录 ETL 服务
//!
//! 循环执行：从队列取消息 -> 校验 -> 转换 -> 写库。
//! 同一时刻只处理一条消息。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    error::{EtlError, ValidationError},
    models::RawLoginEvent,
    queue::MessageQueue,
    repository::RowStore,
    services::transform::{self, Clock, SystemClock},
};

/// 单次迭代的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// 队列中没有消息
    Idle,
    /// 事件未通过校验，已丢弃
    Dropped(ValidationError),
    /// 行已写入
    Loaded,
}

/// 运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub idle_polls: u64,
    pub dropped: u64,
    pub loaded: u64,
}

impl RunStats {
    fn record(&mut self, outcome: &IterationOutcome) {
        match outcome {
            IterationOutcome::Idle => self.idle_polls += 1,
            IterationOutcome::Dropped(_) => self.dropped += 1,
            IterationOutcome::Loaded => self.loaded += 1,
        }
    }
}

pub struct LoginEtlService {
    queue: Arc<dyn MessageQueue>,
    store: Arc<dyn RowStore>,
    clock: Arc<dyn Clock>,
    table: String,
}

impl LoginEtlService {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        store: Arc<dyn RowStore>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            store,
            clock: Arc::new(SystemClock),
            table: table.into(),
        }
    }

    /// 替换 create_date 使用的时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 处理下一条消息
    ///
    /// 校验失败不算错误；队列或数据库错误原样返回，由调用方决定是否终止。
    /// 未在接收时删除的消息，在写入成功或被丢弃后删除。
    pub async fn process_next(&self) -> Result<IterationOutcome, EtlError> {
        let Some(message) = self.queue.receive_next().await? else {
            trace!("Queue empty");
            return Ok(IterationOutcome::Idle);
        };

        let outcome = match RawLoginEvent::from_message(&message.body) {
            Ok(event) => {
                let user_id = event.user_id.clone();
                let row = transform::transform(event, self.clock.today()).into_table_row();

                self.store.write(&self.table, &row).await?;

                debug!(user_id = %user_id, table = %self.table, "Login loaded");
                IterationOutcome::Loaded
            }
            Err(reason) => {
                warn!(reason = %reason, "Dropping invalid login event");
                IterationOutcome::Dropped(reason)
            }
        };

        if !message.deleted {
            self.queue.delete(&message.receipt_handle).await?;
        }

        Ok(outcome)
    }

    /// 持续处理直到收到停止信号或遇到致命错误
    ///
    /// 停止信号只在两次迭代之间检查，正在处理的消息总会处理完。
    pub async fn run(&self, shutdown: CancellationToken) -> Result<RunStats, EtlError> {
        info!(table = %self.table, "Login ETL loop started");

        let mut stats = RunStats::default();

        while !shutdown.is_cancelled() {
            match self.process_next().await {
                Ok(outcome) => stats.record(&outcome),
                Err(e) => {
                    error!(kind = e.kind(), error = %e, "Login ETL loop stopped on fatal error");
                    return Err(e);
                }
            }
        }

        info!(
            loaded = stats.loaded,
            dropped = stats.dropped,
            idle_polls = stats.idle_polls,
            "Login ETL loop stopped"
        );
        Ok(stats)
    }
}
