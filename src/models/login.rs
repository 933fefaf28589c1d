//! 登录事件模型

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde_json::Value;

use super::row::{SqlValue, TableRow};

/// 原始登录事件必须包含的字段
pub const REQUIRED_FIELDS: [&str; 6] = [
    "user_id",
    "device_type",
    "ip",
    "device_id",
    "locale",
    "app_version",
];

/// 队列中收到的原始登录事件（已通过校验）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLoginEvent {
    pub user_id: String,
    pub device_type: String,
    pub ip: String,
    pub device_id: String,
    pub locale: String,
    pub app_version: String,
}

impl RawLoginEvent {
    /// 校验消息体并构造事件
    ///
    /// 字段缺失或为 null 视为缺失；多余字段被忽略。
    pub fn from_message(body: &Value) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or(ValidationError::NotAnObject)?;

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| object.get(*field).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let field = |name: &'static str| -> Result<String, ValidationError> {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or(ValidationError::InvalidFieldType(name))
        };

        Ok(Self {
            user_id: field("user_id")?,
            device_type: field("device_type")?,
            ip: field("ip")?,
            device_id: field("device_id")?,
            locale: field("locale")?,
            app_version: field("app_version")?,
        })
    }
}

/// 写入数据库的登录行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedLoginRow {
    pub user_id: String,
    pub device_type: String,
    pub locale: String,
    pub app_version: String,
    pub masked_ip: String,
    pub masked_device_id: String,
    pub create_date: NaiveDate,
}

impl TransformedLoginRow {
    /// 转换为按列排序的表行
    pub fn into_table_row(self) -> TableRow {
        let mut row = TableRow::new();
        row.push("user_id", SqlValue::Text(self.user_id));
        row.push("device_type", SqlValue::Text(self.device_type));
        row.push("locale", SqlValue::Text(self.locale));
        row.push("app_version", SqlValue::Text(self.app_version));
        row.push("masked_ip", SqlValue::Text(self.masked_ip));
        row.push("masked_device_id", SqlValue::Text(self.masked_device_id));
        row.push("create_date", SqlValue::Date(self.create_date));
        row
    }
}
