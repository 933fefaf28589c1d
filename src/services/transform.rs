//! 登录事件转换规则
//!
//! 掩码只做可逆的字符串旋转，不提供任何加密保护。

use chrono::{Local, NaiveDate};

use crate::models::{RawLoginEvent, TransformedLoginRow};

/// 当前日期来源
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// 使用本地时区的系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// 固定日期的时钟
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// 以 floor(len / 2) 为分割点，把后半段移到前面
///
/// 长度按字符计算。偶数长度时 `mask(mask(s)) == s`；奇数长度请用 [`unmask`] 还原。
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mid = chars.len() / 2;
    chars[mid..].iter().chain(&chars[..mid]).collect()
}

/// [`mask`] 的逆运算，对任意长度成立
pub fn unmask(masked: &str) -> String {
    let chars: Vec<char> = masked.chars().collect();
    let mid = chars.len() - chars.len() / 2;
    chars[mid..].iter().chain(&chars[..mid]).collect()
}

/// 删除版本号中的所有 '.'
pub fn strip_dots(version: &str) -> String {
    version.replace('.', "")
}

/// 转换一条已校验的事件
///
/// 按值消费事件：同一事件不可能被转换两次。
pub fn transform(event: RawLoginEvent, today: NaiveDate) -> TransformedLoginRow {
    TransformedLoginRow {
        masked_ip: mask(&event.ip),
        masked_device_id: mask(&event.device_id),
        app_version: strip_dots(&event.app_version),
        create_date: today,
        user_id: event.user_id,
        device_type: event.device_type,
        locale: event.locale,
    }
}
