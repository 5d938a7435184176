//! 语句构建器
//!
//! 根据 [`EntitySchema`] 生成 INSERT / UPDATE / SELECT / DELETE 语句及有序参数。
//!
//! ## 约束
//!
//! - 值一律通过 `$n` 占位符绑定，只有表名和列名会写进语句文本，
//!   且它们都来自实体的静态布局
//! - 同一条语句中第 N 个列、第 N 个占位符、第 N 个参数一一对应
//! - 带 `deleted_at` 列的实体，读取和按 ID 的变更只作用于未软删除的行；
//!   物理删除不受此限制

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::error::BoxDynError;
use sqlx::postgres::PgArguments;

use crate::entity::{Column, ColumnRole, EntitySchema};
use crate::error::{RepositoryError, Result};
use crate::value::{FieldMap, SqlValue, to_arguments};

/// 构建好的语句
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

impl Statement {
    /// 转换为 sqlx 参数
    pub fn arguments(&self) -> std::result::Result<PgArguments, BoxDynError> {
        to_arguments(&self.args)
    }
}

/// 为标识符加双引号，`schema.table` 形式逐段处理
pub fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// 参数收集器，负责分配占位符序号
#[derive(Default)]
struct Params {
    args: Vec<SqlValue>,
}

impl Params {
    fn push(&mut self, value: SqlValue) -> String {
        self.args.push(value);
        format!("${}", self.args.len())
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            args: self.args,
        }
    }
}

/// 实体语句构建器
pub struct QueryBuilder<'s> {
    schema: &'s EntitySchema,
}

impl<'s> QueryBuilder<'s> {
    pub fn new(schema: &'s EntitySchema) -> Self {
        Self { schema }
    }

    /// 插入语句
    ///
    /// 跳过身份列和 `deleted_at`；`created_at` / `updated_at` 一律写入 `now`，
    /// 并返回整行，供调用方回填数据库生成的值。
    pub fn insert(&self, values: &[SqlValue], now: DateTime<Utc>) -> Result<Statement> {
        self.schema.check_values(values)?;

        let mut params = Params::default();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();

        for (column, value) in self.schema.columns().iter().zip(values) {
            let value = match column.role {
                ColumnRole::Identity | ColumnRole::DeletedAt => continue,
                ColumnRole::CreatedAt | ColumnRole::UpdatedAt => SqlValue::Timestamp(Some(now)),
                ColumnRole::Value => value.clone(),
            };
            columns.push(quote_ident(&column.name));
            placeholders.push(params.push(value));
        }

        let sql = if columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING {}",
                self.table(),
                self.projection()
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                self.table(),
                columns.join(", "),
                placeholders.join(", "),
                self.projection()
            )
        };

        Ok(params.finish(sql))
    }

    /// 按 ID 的整体更新语句
    ///
    /// 跳过身份列、`created_at` 和 `deleted_at`；`updated_at` 写入 `now`；ID 作为最后一个参数。
    pub fn update_by_id(&self, values: &[SqlValue], id: i64, now: DateTime<Utc>) -> Result<Statement> {
        self.schema.check_values(values)?;
        let identity = self.identity()?;

        let mut params = Params::default();
        let mut assignments = Vec::new();

        for (column, value) in self.schema.columns().iter().zip(values) {
            let value = match column.role {
                ColumnRole::Identity | ColumnRole::CreatedAt | ColumnRole::DeletedAt => continue,
                ColumnRole::UpdatedAt => SqlValue::Timestamp(Some(now)),
                ColumnRole::Value => value.clone(),
            };
            assignments.push(format!("{} = {}", quote_ident(&column.name), params.push(value)));
        }

        if assignments.is_empty() {
            return Err(RepositoryError::EmptyUpdate {
                table: self.schema.table(),
            });
        }

        let filter = self.id_filter(identity, id, &mut params);
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(),
            assignments.join(", "),
            filter
        );

        Ok(params.finish(sql))
    }

    /// 部分字段更新语句
    ///
    /// 空映射直接返回 `EmptyUpdate`；调用方未提供 `updated_at` 时自动补上 `now`。
    pub fn partial_update(&self, id: i64, updates: &FieldMap, now: DateTime<Utc>) -> Result<Statement> {
        if updates.is_empty() {
            return Err(RepositoryError::EmptyUpdate {
                table: self.schema.table(),
            });
        }
        let identity = self.identity()?;

        let mut params = Params::default();
        let mut assignments = Vec::with_capacity(updates.len() + 1);
        let mut assigned = HashSet::with_capacity(updates.len());

        for (key, value) in updates {
            let column = self.schema.resolve(key)?;
            match column.role {
                ColumnRole::Identity | ColumnRole::CreatedAt | ColumnRole::DeletedAt => {
                    return Err(RepositoryError::ImmutableColumn {
                        table: self.schema.table(),
                        column: column.name.clone(),
                    });
                }
                ColumnRole::UpdatedAt | ColumnRole::Value => {}
            }
            if !assigned.insert(column.name.as_str()) {
                return Err(RepositoryError::DuplicateColumn {
                    table: self.schema.table(),
                    column: column.name.clone(),
                });
            }
            assignments.push(format!(
                "{} = {}",
                quote_ident(&column.name),
                params.push(value.clone())
            ));
        }

        if let Some(updated_at) = self.schema.column_by_role(ColumnRole::UpdatedAt) {
            if !assigned.contains(updated_at.name.as_str()) {
                assignments.push(format!(
                    "{} = {}",
                    quote_ident(&updated_at.name),
                    params.push(SqlValue::Timestamp(Some(now)))
                ));
            }
        }

        let filter = self.id_filter(identity, id, &mut params);
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table(),
            assignments.join(", "),
            filter
        );

        Ok(params.finish(sql))
    }

    /// 条件查询语句
    ///
    /// `limit` / `offset` 小于等于 0 时不加限制。
    pub fn select(&self, conditions: &FieldMap, limit: i64, offset: i64) -> Result<Statement> {
        let mut params = Params::default();
        let mut sql = format!("SELECT {} FROM {}", self.projection(), self.table());
        sql.push_str(&self.where_clause(conditions, &mut params)?);

        if let Some(identity) = self.schema.column_by_role(ColumnRole::Identity) {
            sql.push_str(&format!(" ORDER BY {} ASC", quote_ident(&identity.name)));
        }
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {}", params.push(SqlValue::BigInt(Some(limit)))));
        }
        if offset > 0 {
            sql.push_str(&format!(" OFFSET {}", params.push(SqlValue::BigInt(Some(offset)))));
        }

        Ok(params.finish(sql))
    }

    /// 按 ID 查询语句
    pub fn select_by_id(&self, id: i64) -> Result<Statement> {
        let identity = self.identity()?;
        let mut params = Params::default();
        let filter = self.id_filter(identity, id, &mut params);
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            self.projection(),
            self.table(),
            filter
        );
        Ok(params.finish(sql))
    }

    /// 计数语句
    pub fn count(&self, conditions: &FieldMap) -> Result<Statement> {
        let mut params = Params::default();
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table());
        sql.push_str(&self.where_clause(conditions, &mut params)?);
        Ok(params.finish(sql))
    }

    /// 存在性检查语句
    pub fn exists(&self, id: i64) -> Result<Statement> {
        let identity = self.identity()?;
        let mut params = Params::default();
        let filter = self.id_filter(identity, id, &mut params);
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {})", self.table(), filter);
        Ok(params.finish(sql))
    }

    /// 软删除语句，已软删除的行不会再次命中
    pub fn soft_delete(&self, id: i64, now: DateTime<Utc>) -> Result<Statement> {
        let identity = self.identity()?;
        let deleted_at = self
            .schema
            .column_by_role(ColumnRole::DeletedAt)
            .ok_or(RepositoryError::MissingColumn {
                table: self.schema.table(),
                role: ColumnRole::DeletedAt.as_str(),
            })?;

        let mut params = Params::default();
        let assignment = format!(
            "{} = {}",
            quote_ident(&deleted_at.name),
            params.push(SqlValue::Timestamp(Some(now)))
        );
        let filter = self.id_filter(identity, id, &mut params);
        let sql = format!("UPDATE {} SET {} WHERE {}", self.table(), assignment, filter);

        Ok(params.finish(sql))
    }

    /// 物理删除语句
    pub fn hard_delete(&self, id: i64) -> Result<Statement> {
        let identity = self.identity()?;
        let mut params = Params::default();
        let placeholder = params.push(SqlValue::BigInt(Some(id)));
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.table(),
            quote_ident(&identity.name),
            placeholder
        );
        Ok(params.finish(sql))
    }

    fn table(&self) -> String {
        quote_ident(self.schema.table())
    }

    fn projection(&self) -> String {
        self.schema
            .columns()
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn identity(&self) -> Result<&'s Column> {
        self.schema
            .column_by_role(ColumnRole::Identity)
            .ok_or(RepositoryError::MissingColumn {
                table: self.schema.table(),
                role: ColumnRole::Identity.as_str(),
            })
    }

    /// 软删除过滤条件
    fn live_filter(&self) -> Option<String> {
        self.schema
            .column_by_role(ColumnRole::DeletedAt)
            .map(|c| format!("{} IS NULL", quote_ident(&c.name)))
    }

    fn id_filter(&self, identity: &Column, id: i64, params: &mut Params) -> String {
        let mut filter = format!(
            "{} = {}",
            quote_ident(&identity.name),
            params.push(SqlValue::BigInt(Some(id)))
        );
        if let Some(live) = self.live_filter() {
            filter.push_str(" AND ");
            filter.push_str(&live);
        }
        filter
    }

    /// 等值 AND 条件，NULL 值渲染为 `IS NULL`
    ///
    /// 软删除过滤总会追加 `deleted_at IS NULL`，因此 `deleted_at` 上的非 NULL 条件
    /// 永远无法命中，直接拒绝。
    fn where_clause(&self, conditions: &FieldMap, params: &mut Params) -> Result<String> {
        let mut clauses = Vec::with_capacity(conditions.len() + 1);

        for (key, value) in conditions {
            let resolved = self.schema.resolve(key)?;
            if resolved.role == ColumnRole::DeletedAt && !value.is_null() {
                return Err(RepositoryError::ImmutableColumn {
                    table: self.schema.table(),
                    column: resolved.name.clone(),
                });
            }
            let column = quote_ident(&resolved.name);
            if value.is_null() {
                clauses.push(format!("{column} IS NULL"));
            } else {
                clauses.push(format!("{column} = {}", params.push(value.clone())));
            }
        }
        if let Some(live) = self.live_filter() {
            clauses.push(live);
        }

        if clauses.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" WHERE {}", clauses.join(" AND ")))
        }
    }
}
