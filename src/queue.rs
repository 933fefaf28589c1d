//! SQS 队列客户端
//!
//! 每次最多拉取一条消息，并按删除策略负责将其从队列中移除

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client as SqsClient;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{DeletePolicy, QueueConfig};
use crate::error::QueueError;

/// 从队列收到的一条消息
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    /// 解析后的消息体
    pub body: Value,
    /// 本次投递的回执句柄，删除消息时使用
    pub receipt_handle: String,
    /// 是否已从队列删除
    pub deleted: bool,
}

/// 消息队列抽象
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// 获取下一条消息；队列为空时返回 None
    async fn receive_next(&self) -> Result<Option<QueueMessage>, QueueError>;

    /// 按回执句柄删除消息
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}

/// 基于 AWS SQS 的队列客户端
pub struct SqsQueue {
    client: SqsClient,
    queue_url: String,
    wait_time_seconds: i32,
    delete_policy: DeletePolicy,
}

impl SqsQueue {
    /// 根据配置创建客户端
    pub async fn connect(config: &QueueConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = config.endpoint() {
            loader = loader.endpoint_url(endpoint);
        }

        // 显式凭证优先于默认凭证链
        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let creds = aws_sdk_sqs::config::Credentials::new(
                access_key,
                secret_key.expose_secret(),
                None,
                None,
                "login-etl",
            );
            loader = loader.credentials_provider(creds);
        }

        let sdk_config = loader.load().await;

        info!(
            queue_url = %config.queue_url,
            region = %config.region,
            delete_policy = ?config.delete_policy,
            "SQS client created"
        );

        Self::from_client(
            SqsClient::new(&sdk_config),
            config.queue_url.clone(),
            config.wait_time_seconds,
            config.delete_policy,
        )
    }

    pub fn from_client(
        client: SqsClient,
        queue_url: String,
        wait_time_seconds: i32,
        delete_policy: DeletePolicy,
    ) -> Self {
        Self {
            client,
            queue_url,
            wait_time_seconds,
            delete_policy,
        }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive_next(&self) -> Result<Option<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(self.wait_time_seconds)
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(&e).to_string()))?;

        let Some(message) = output.messages().first() else {
            return Ok(None);
        };

        debug!(message_id = ?message.message_id(), "Message received");

        let received =
            settle_received(self.delete_policy, message.receipt_handle(), message.body());

        if let Some(receipt_handle) = &received.delete {
            if received.result.is_err() {
                warn!(message_id = ?message.message_id(), "Deleting unparseable message");
            }
            self.delete(receipt_handle).await?;
        }

        received.result.map(Some)
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete(DisplayErrorContext(&e).to_string()))?;

        debug!("Message deleted");
        Ok(())
    }
}

/// 收到一条消息后的处理决定
#[derive(Debug)]
pub struct Received {
    /// 返回前需要删除的回执句柄
    pub delete: Option<String>,
    pub result: Result<QueueMessage, QueueError>,
}

/// 按删除策略决定是否删除，并解析消息体
///
/// `OnReceipt` 总是删除；`AfterWrite` 只删除无法解析的消息（重投也不会成功）。
/// 没有回执句柄时无法删除，直接返回错误。
pub fn settle_received(
    policy: DeletePolicy,
    receipt_handle: Option<&str>,
    body: Option<&str>,
) -> Received {
    let Some(receipt_handle) = receipt_handle else {
        return Received {
            delete: None,
            result: Err(QueueError::MissingReceiptHandle),
        };
    };

    let parsed = parse_body(body);
    let delete = match (policy, &parsed) {
        (DeletePolicy::OnReceipt, _) | (DeletePolicy::AfterWrite, Err(_)) => {
            Some(receipt_handle.to_string())
        }
        (DeletePolicy::AfterWrite, Ok(_)) => None,
    };

    Received {
        result: parsed.map(|body| QueueMessage {
            body,
            receipt_handle: receipt_handle.to_string(),
            deleted: policy == DeletePolicy::OnReceipt,
        }),
        delete,
    }
}

/// 将消息体解析为 JSON
pub fn parse_body(body: Option<&str>) -> Result<Value, QueueError> {
    let body = body.ok_or(QueueError::MissingBody)?;
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body_object() {
        let body = parse_body(Some(r#"{"user_id":"42","locale":"fr-FR"}"#)).unwrap();
        assert_eq!(body, json!({"user_id": "42", "locale": "fr-FR"}));
    }

    #[test]
    fn test_parse_body_non_object_is_not_an_error() {
        assert_eq!(parse_body(Some("[1,2]")).unwrap(), json!([1, 2]));
        assert_eq!(parse_body(Some("null")).unwrap(), Value::Null);
    }

    #[test]
    fn test_on_receipt_deletes_before_returning() {
        let received = settle_received(DeletePolicy::OnReceipt, Some("r-1"), Some(r#"{"a":"b"}"#));

        assert_eq!(received.delete.as_deref(), Some("r-1"));
        let message = received.result.unwrap();
        assert!(message.deleted);
        assert_eq!(message.receipt_handle, "r-1");
        assert_eq!(message.body, json!({"a": "b"}));
    }

    #[test]
    fn test_on_receipt_deletes_unparseable_body() {
        let received = settle_received(DeletePolicy::OnReceipt, Some("r-1"), Some("{not json"));

        assert_eq!(received.delete.as_deref(), Some("r-1"));
        assert!(matches!(received.result, Err(QueueError::MalformedBody(_))));
    }

    #[test]
    fn test_after_write_keeps_parseable_message() {
        let received = settle_received(DeletePolicy::AfterWrite, Some("r-2"), Some("[1]"));

        assert_eq!(received.delete, None);
        let message = received.result.unwrap();
        assert!(!message.deleted);
        assert_eq!(message.receipt_handle, "r-2");
    }

    #[test]
    fn test_after_write_deletes_unparseable_body() {
        let received = settle_received(DeletePolicy::AfterWrite, Some("r-3"), Some("{not json"));
        assert_eq!(received.delete.as_deref(), Some("r-3"));
        assert!(matches!(received.result, Err(QueueError::MalformedBody(_))));

        let received = settle_received(DeletePolicy::AfterWrite, Some("r-4"), None);
        assert_eq!(received.delete.as_deref(), Some("r-4"));
        assert!(matches!(received.result, Err(QueueError::MissingBody)));
    }

    #[test]
    fn test_missing_receipt_handle() {
        for policy in [DeletePolicy::OnReceipt, DeletePolicy::AfterWrite] {
            let received = settle_received(policy, None, Some(r#"{"a":"b"}"#));
            assert_eq!(received.delete, None);
            assert!(matches!(
                received.result,
                Err(QueueError::MissingReceiptHandle)
            ));
        }
    }

    #[test]
    fn test_parse_body_malformed() {
        assert!(matches!(
            parse_body(Some("{not json")),
            Err(QueueError::MalformedBody(_))
        ));
        assert!(matches!(parse_body(None), Err(QueueError::MissingBody)));
    }
}
