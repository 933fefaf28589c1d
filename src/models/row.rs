//! 通用表行：有序的 列名 -> 值 映射

use chrono::NaiveDate;

/// 绑定到 SQL 参数的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Date(NaiveDate),
}

/// 按插入顺序保存列的单行数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    values: Vec<(String, SqlValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一列；同名列会覆盖原值并保留原位置
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        let column = column.into();
        match self.values.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
