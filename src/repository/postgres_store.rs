//! 行写入仓库 (PostgreSQL)

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::StoreError;
use crate::models::{SqlValue, TableRow};

/// 关系存储抽象：向指定表插入一行
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn write(&self, table: &str, row: &TableRow) -> Result<(), StoreError>;
}

/// 将名称作为 PostgreSQL 标识符加引号（内部双引号转义为两个）
pub fn quote_identifier(name: &str) -> Result<String, StoreError> {
    if name.is_empty() || name.contains('\0') {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// 构造单行参数化 INSERT 语句
///
/// 表名与列名只以加引号的标识符出现，所有值都作为参数绑定。
pub fn insert_statement(
    table: &str,
    row: &TableRow,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    if row.is_empty() {
        return Err(StoreError::EmptyRow);
    }

    let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
    builder.push(quote_identifier(table)?);
    builder.push(" (");

    let mut columns = builder.separated(", ");
    for column in row.columns() {
        columns.push(quote_identifier(column)?);
    }

    builder.push(") VALUES (");

    let mut values = builder.separated(", ");
    for (_, value) in row.iter() {
        match value {
            SqlValue::Text(text) => values.push_bind(text.clone()),
            SqlValue::Date(date) => values.push_bind(*date),
        };
    }

    builder.push(")");
    Ok(builder)
}

pub struct PostgresStore {
    db: PgPool,
}

impl PostgresStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RowStore for PostgresStore {
    /// 在事务中插入一行；出错时事务随 drop 回滚
    async fn write(&self, table: &str, row: &TableRow) -> Result<(), StoreError> {
        let mut statement = insert_statement(table, row)?;

        let mut tx = self.db.begin().await?;
        statement.build().execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::debug!(table = %table, columns = row.len(), "Row inserted");
        Ok(())
    }
}
