//! 实体契约与字段布局
//!
//! 每个可持久化的类型实现 [`Entity`]：报告表名，并以静态描述符
//! （[`FieldDef`] 列表）声明字段到列的映射。仓储在每次调用时把描述符解析为
//! [`EntitySchema`]，再由查询构建器据此生成语句，无需为每个实体手写 SQL。
//!
//! ## 保留列
//!
//! | 列名 | 角色 | 处理方式 |
//! |------|------|----------|
//! | `id` | 身份 | 由数据库分配，插入/更新不写入，作为按 ID 操作的条件 |
//! | `created_at` | 创建时间 | 仅在插入时写入当前时间 |
//! | `updated_at` | 更新时间 | 插入和每次更新都写入当前时间 |
//! | `deleted_at` | 软删除标记 | 只由软删除写入，读取时过滤非空行 |

use std::borrow::Cow;
use std::collections::HashSet;

use sqlx::FromRow;
use sqlx::postgres::PgRow;

use crate::error::{RepositoryError, Result};
use crate::value::SqlValue;

/// 可存储实体
///
/// `fields()` 与 `values()` 必须一一对应（同样的顺序、同样的数量），
/// 这是生成语句时列、占位符和参数对齐的前提。
///
/// ```ignore
/// impl Entity for Project {
///     fn table_name() -> &'static str { "projects" }
///     fn fields() -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];
///         FIELDS
///     }
///     fn values(&self) -> Vec<SqlValue> {
///         vec![self.id.into(), self.name.clone().into()]
///     }
/// }
/// ```
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    /// 实体对应的表名
    fn table_name() -> &'static str;

    /// 按声明顺序排列的字段描述符
    fn fields() -> &'static [FieldDef];

    /// 与 `fields()` 顺序一致的字段值
    fn values(&self) -> Vec<SqlValue>;

    /// 身份值
    ///
    /// 默认从身份列对应的字段值读取；实体没有身份列时返回 `None`。
    fn id(&self) -> Option<i64> {
        let index = Self::fields()
            .iter()
            .position(|field| field.column_name() == "id")?;
        self.values().get(index).and_then(SqlValue::as_i64)
    }
}

/// 字段描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    field: &'static str,
    column: Option<&'static str>,
}

impl FieldDef {
    /// 列名取字段名的小写形式
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
            column: None,
        }
    }

    /// 显式指定列名
    pub const fn column(field: &'static str, column: &'static str) -> Self {
        Self {
            field,
            column: Some(column),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// 解析后的列名
    pub fn column_name(&self) -> Cow<'static, str> {
        match self.column {
            Some(column) => Cow::Borrowed(column),
            None if self.field.chars().any(|c| c.is_uppercase()) => {
                Cow::Owned(self.field.to_lowercase())
            }
            None => Cow::Borrowed(self.field),
        }
    }
}

/// 列在语句构建中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Identity,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    Value,
}

impl ColumnRole {
    fn from_column(name: &str) -> Self {
        match name {
            "id" => Self::Identity,
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            "deleted_at" => Self::DeletedAt,
            _ => Self::Value,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "id",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::DeletedAt => "deleted_at",
            Self::Value => "value",
        }
    }
}

/// 解析后的列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub name: String,
    pub role: ColumnRole,
}

/// 实体的列布局
#[derive(Debug, Clone)]
pub struct EntitySchema {
    table: &'static str,
    columns: Vec<Column>,
}

impl EntitySchema {
    /// 解析实体的字段描述符
    pub fn of<E: Entity>() -> Result<Self> {
        Self::from_fields(E::table_name(), E::fields())
    }

    /// 由表名和描述符构建，列名重复时报错
    pub fn from_fields(table: &'static str, fields: &[FieldDef]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(fields.len());
        let mut columns = Vec::with_capacity(fields.len());

        for field in fields {
            let name = field.column_name().into_owned();
            if !seen.insert(name.clone()) {
                return Err(RepositoryError::DuplicateColumn { table, column: name });
            }
            columns.push(Column {
                field: field.field(),
                role: ColumnRole::from_column(&name),
                name,
            });
        }

        Ok(Self { table, columns })
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// 按角色查找列
    pub fn column_by_role(&self, role: ColumnRole) -> Option<&Column> {
        self.columns.iter().find(|c| c.role == role)
    }

    /// 是否启用软删除
    pub fn is_soft_deletable(&self) -> bool {
        self.column_by_role(ColumnRole::DeletedAt).is_some()
    }

    /// 按列名或字段名查找列
    ///
    /// 调用方传入的键只有命中静态布局才会被写进语句。
    pub fn resolve(&self, key: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == key)
            .or_else(|| self.columns.iter().find(|c| c.field == key))
            .ok_or_else(|| RepositoryError::UnknownColumn {
                table: self.table,
                column: key.to_string(),
            })
    }

    /// 检查值的数量与列定义一致
    pub fn check_values(&self, values: &[SqlValue]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(RepositoryError::SchemaMismatch {
                table: self.table,
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }
}
