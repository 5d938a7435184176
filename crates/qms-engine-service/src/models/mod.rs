//! 实体模型

mod project;

pub use project::Project;
