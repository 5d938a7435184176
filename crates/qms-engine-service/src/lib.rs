//! QMS 引擎服务
//!
//! 提供项目创建 REST API，数据访问基于 `qms-repository` 的通用仓储。
//!
//! ## 模块结构
//!
//! - `models`: 实体模型
//! - `dto`: 请求和响应的数据传输对象
//! - `service`: 业务流程（事务内的名称查重与插入）
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态
//! - `error`: 错误类型与 HTTP 映射

pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;
pub mod state;

pub use dto::{ApiResponse, CreateProjectRequest, CreateProjectResponse};
pub use error::{ErrorDetail, Result, ServiceError};
pub use models::Project;
pub use service::{ProjectService, ProjectServiceTrait};
pub use state::AppState;
