//! 应用状态定义

use std::sync::Arc;

use crate::service::ProjectServiceTrait;

/// Axum 应用共享状态
///
/// 服务以 trait 对象持有，测试中可替换为 mock 实现
#[derive(Clone)]
pub struct AppState {
    pub project_service: Arc<dyn ProjectServiceTrait>,
}

impl AppState {
    pub fn new(project_service: Arc<dyn ProjectServiceTrait>) -> Self {
        Self { project_service }
    }
}
