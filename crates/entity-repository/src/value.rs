//! 绑定参数值
//!
//! 实体字段在进入 SQL 之前统一转换为 [`SqlValue`]，始终以绑定参数的形式传递，
//! 不会拼接进语句文本。每个变体都携带 `Option`，NULL 也能以正确的列类型绑定。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::Arguments;
use sqlx::error::BoxDynError;
use sqlx::postgres::PgArguments;
use uuid::Uuid;

/// 可绑定到 PostgreSQL 语句的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Double(Option<f64>),
    Text(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
    Uuid(Option<Uuid>),
    Json(Option<serde_json::Value>),
}

/// 列名（或字段名）到值的映射，用于查询条件和部分更新
///
/// 使用有序映射，保证同样的输入总是生成同样的语句。
pub type FieldMap = BTreeMap<String, SqlValue>;

impl SqlValue {
    /// 是否为 NULL
    pub fn is_null(&self) -> bool {
        match self {
            Self::Bool(v) => v.is_none(),
            Self::Int(v) => v.is_none(),
            Self::BigInt(v) => v.is_none(),
            Self::Double(v) => v.is_none(),
            Self::Text(v) => v.is_none(),
            Self::Timestamp(v) => v.is_none(),
            Self::Uuid(v) => v.is_none(),
            Self::Json(v) => v.is_none(),
        }
    }

    /// 作为整数身份值读取（BIGINT / INT）
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::BigInt(v) => *v,
            Self::Int(v) => v.map(i64::from),
            _ => None,
        }
    }

    /// 追加到参数列表末尾
    pub(crate) fn add_to(&self, args: &mut PgArguments) -> Result<(), BoxDynError> {
        match self {
            Self::Bool(v) => args.add(*v),
            Self::Int(v) => args.add(*v),
            Self::BigInt(v) => args.add(*v),
            Self::Double(v) => args.add(*v),
            Self::Text(v) => args.add(v.clone()),
            Self::Timestamp(v) => args.add(*v),
            Self::Uuid(v) => args.add(*v),
            Self::Json(v) => args.add(v.clone()),
        }
    }
}

/// 按顺序构建参数列表
pub(crate) fn to_arguments(values: &[SqlValue]) -> Result<PgArguments, BoxDynError> {
    let mut args = PgArguments::default();
    for value in values {
        value.add_to(&mut args)?;
    }
    Ok(args)
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(Some(value))
                }
            }

            impl From<Option<$ty>> for SqlValue {
                fn from(value: Option<$ty>) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i32 => Int,
    i64 => BigInt,
    f64 => Double,
    String => Text,
    DateTime<Utc> => Timestamp,
    Uuid => Uuid,
    serde_json::Value => Json,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(Some(value.to_string()))
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(value: Option<&str>) -> Self {
        Self::Text(value.map(str::to_string))
    }
}

/// 构建 [`FieldMap`]
///
/// ```ignore
/// let conditions = fields! { "name" => "alpha", "owner_id" => 7_i64 };
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::FieldMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::FieldMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::SqlValue::from($value));
        )+
        map
    }};
}
