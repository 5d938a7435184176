//! 业务服务层

mod project_service;

#[cfg(test)]
pub use project_service::MockProjectServiceTrait;
pub use project_service::{ProjectService, ProjectServiceTrait};
