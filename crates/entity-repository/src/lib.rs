//! 通用实体仓储
//!
//! 为任意实现了 [`Entity`] 的类型提供 PostgreSQL 上的增删改查：
//!
//! - **实体契约** (`entity`): 表名 + 静态字段描述符，解析为列布局
//! - **参数值** (`value`): 类型化、可为 NULL 的绑定参数
//! - **语句构建** (`query`): 由列布局生成参数化语句
//! - **仓储** (`repository`): 主从读写分离、软删除、批量操作和事务
//!
//! ```ignore
//! let repo: Repository<Project> = Repository::new(db);
//! let mut project = Project::new("alpha", "first");
//! repo.save(&mut project).await?;
//! let found = repo.find_one(&fields! { "name" => "alpha" }).await?;
//! ```

pub mod entity;
pub mod error;
pub mod query;
pub mod repository;
pub mod value;

pub use entity::{Column, ColumnRole, Entity, EntitySchema, FieldDef};
pub use error::{RepositoryError, Result};
pub use query::{QueryBuilder, Statement};
pub use repository::{Repository, rollback_logged};
pub use value::{FieldMap, SqlValue};

pub use qms_shared::DbConnections;
