//! 项目实体

use chrono::{DateTime, Utc};
use qms_repository::{Entity, FieldDef, SqlValue};
use serde::Serialize;

/// 项目
///
/// 名称以小写形式存储，在未删除的项目中唯一。
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    pub const TABLE: &'static str = "projects";

    /// 构造待插入的项目，ID 和时间戳在插入时由仓储写入
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

impl Entity for Project {
    fn table_name() -> &'static str {
        Self::TABLE
    }

    fn fields() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            FieldDef::new("id"),
            FieldDef::new("name"),
            FieldDef::new("description"),
            FieldDef::new("created_at"),
            FieldDef::new("updated_at"),
            FieldDef::new("deleted_at"),
        ];
        FIELDS
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.description.clone().into(),
            self.created_at.into(),
            self.updated_at.into(),
            self.deleted_at.into(),
        ]
    }
}
