//! 仓储错误类型
//!
//! 仓储从不重试；每个数据库错误都带上操作名和表名后返回给调用方，
//! 由调用方进一步归类。

use thiserror::Error;

/// 仓储错误类型
#[derive(Debug, Error)]
pub enum RepositoryError {
    // ==================== 语义错误 ====================
    #[error("记录未找到: table={table} {key}")]
    NotFound { table: &'static str, key: String },

    #[error("没有需要更新的字段: table={table}")]
    EmptyUpdate { table: &'static str },

    #[error("实体缺少有效 ID: table={table}")]
    MissingId { table: &'static str },

    #[error("记录已存在: table={table} constraint={constraint}")]
    UniqueViolation {
        table: &'static str,
        constraint: String,
    },

    // ==================== 布局错误 ====================
    #[error("未知列: {table}.{column}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("列不允许直接更新: {table}.{column}")]
    ImmutableColumn { table: &'static str, column: String },

    #[error("重复的列定义: {table}.{column}")]
    DuplicateColumn { table: &'static str, column: String },

    #[error("实体未定义 {role} 列: table={table}")]
    MissingColumn {
        table: &'static str,
        role: &'static str,
    },

    #[error("字段值数量与列定义不一致: table={table}, 期望 {expected}, 实际 {actual}")]
    SchemaMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    // ==================== 数据库错误 ====================
    #[error("{operation} 执行失败: table={table}: {source}")]
    Database {
        operation: &'static str,
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, RepositoryError>;

impl RepositoryError {
    /// 包装数据库错误
    ///
    /// 唯一约束冲突单独归类，其余错误保留原始 sqlx 错误作为 source。
    pub fn database(operation: &'static str, table: &'static str, source: sqlx::Error) -> Self {
        if let Some(db_err) = source.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::UniqueViolation {
                    table,
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
        }

        Self::Database {
            operation,
            table,
            source,
        }
    }

    pub(crate) fn not_found_id(table: &'static str, id: i64) -> Self {
        Self::NotFound {
            table,
            key: format!("id={id}"),
        }
    }

    /// 是否为"记录不存在"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::EmptyUpdate { .. } => "EMPTY_UPDATE",
            Self::MissingId { .. } => "MISSING_ID",
            Self::UniqueViolation { .. } => "UNIQUE_VIOLATION",
            Self::UnknownColumn { .. } => "UNKNOWN_COLUMN",
            Self::ImmutableColumn { .. } => "IMMUTABLE_COLUMN",
            Self::DuplicateColumn { .. } => "DUPLICATE_COLUMN",
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::Database { .. } => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = RepositoryError::not_found_id("projects", 999_999);
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("id=999999"));
    }

    #[test]
    fn test_database_error_keeps_context() {
        let err = RepositoryError::database("find_by_id", "projects", sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert!(!err.is_not_found());

        let message = err.to_string();
        assert!(message.contains("find_by_id"));
        assert!(message.contains("projects"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_empty_update_is_not_not_found() {
        let err = RepositoryError::EmptyUpdate { table: "projects" };
        assert_eq!(err.code(), "EMPTY_UPDATE");
        assert!(!err.is_not_found());
    }
}
