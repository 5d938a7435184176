//! 项目服务
//!
//! 创建项目的事务流程：
//!
//! ```text
//! 开启事务 -> 名称查重 -> 插入 -> 提交
//!    │           │         │       │
//!    └───────────┴─────────┴───────┴──> 回滚（任一步失败）
//! ```
//!
//! 事务在流程开始时创建，未提交就被丢弃（包括请求超时取消）时自动回滚；
//! 显式失败路径会先主动回滚并记录回滚失败，再返回原始错误。

use async_trait::async_trait;
use qms_repository::{Repository, RepositoryError, fields, rollback_logged};
use qms_shared::observability::metrics::record_project_creation;
use tracing::{error, info, instrument, warn};

use crate::dto::{CreateProjectRequest, CreateProjectResponse};
use crate::error::{ErrorDetail, Result, ServiceError};
use crate::models::Project;

/// 名称列的字符上限
const NAME_MAX_CHARS: usize = 50;

/// 项目服务接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectServiceTrait: Send + Sync {
    /// 创建项目，名称（忽略大小写）已存在时返回 `Forbidden`
    async fn create_project(&self, request: CreateProjectRequest) -> Result<CreateProjectResponse>;
}

/// 基于通用仓储的项目服务
pub struct ProjectService {
    projects: Repository<Project>,
}

impl ProjectService {
    pub fn new(projects: Repository<Project>) -> Self {
        Self { projects }
    }

    async fn create(&self, request: CreateProjectRequest) -> Result<CreateProjectResponse> {
        let name = normalize_name(&request.name)?;

        let mut tx = self.projects.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction");
            ServiceError::Internal(e.to_string())
        })?;

        let lookup = self
            .projects
            .find_one_in(&mut *tx, &fields! { "name" => name.as_str() })
            .await;
        if let Err(e) = check_name_available(lookup, &name) {
            rollback_logged(tx, Project::TABLE).await;
            return Err(e);
        }

        let mut project = Project::new(name, request.description.unwrap_or_default());
        if let Err(e) = self.projects.save_in(&mut *tx, &mut project).await {
            rollback_logged(tx, Project::TABLE).await;
            return Err(classify_save_error(e, &project.name));
        }

        tx.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit project");
            ServiceError::Internal(e.to_string())
        })?;

        info!(project_id = project.id, name = %project.name, "Project created");
        Ok(CreateProjectResponse::from(project))
    }
}

#[async_trait]
impl ProjectServiceTrait for ProjectService {
    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_project(&self, request: CreateProjectRequest) -> Result<CreateProjectResponse> {
        let result = self.create(request).await;

        let outcome = match &result {
            Ok(_) => "created",
            Err(ServiceError::Forbidden(_)) => "conflict",
            Err(ServiceError::BadRequest(_)) => "rejected",
            Err(ServiceError::Internal(_)) => "failed",
        };
        record_project_creation(outcome);

        result
    }
}

/// 名称转小写
///
/// 部分字符转小写后会变长（如 `İ`），超出列宽时按请求无效处理。
fn normalize_name(name: &str) -> Result<String> {
    let normalized = name.to_lowercase();
    if normalized.chars().count() > NAME_MAX_CHARS {
        warn!(name, "Project name too long after lowercasing");
        return Err(ServiceError::BadRequest(vec![ErrorDetail {
            error_code: "VALIDATION_ERROR".to_string(),
            message: format!("项目名称转为小写后不能超过{NAME_MAX_CHARS}个字符"),
            path: "name".to_string(),
        }]));
    }
    Ok(normalized)
}

/// 名称查重结果归类
///
/// 查到记录为冲突；"记录不存在"是继续流程的正常路径；其他错误为内部错误。
fn check_name_available(
    lookup: std::result::Result<Project, RepositoryError>,
    name: &str,
) -> Result<()> {
    match lookup {
        Ok(existing) => {
            warn!(name, existing_id = existing.id, "Project name already exists");
            Err(ServiceError::Forbidden(format!("项目名称已存在: {name}")))
        }
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => {
            error!(error = %e, "Project lookup failed");
            Err(ServiceError::Internal(e.to_string()))
        }
    }
}

/// 插入失败归类：并发创建同名项目时由唯一索引兜底，同样视为冲突
fn classify_save_error(err: RepositoryError, name: &str) -> ServiceError {
    match err {
        RepositoryError::UniqueViolation { .. } => {
            warn!(name, "Project name taken by a concurrent creation");
            ServiceError::Forbidden(format!("项目名称已存在: {name}"))
        }
        other => {
            error!(error = %other, "Failed to save project");
            ServiceError::Internal(other.to_string())
        }
    }
}
