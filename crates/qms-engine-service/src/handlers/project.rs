//! 项目 API 处理器

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateProjectRequest, CreateProjectResponse},
    error::ServiceError,
    state::AppState,
};

/// 创建项目
///
/// POST /v1/project
///
/// 请求体解析失败或校验不通过时直接返回 400，不进入服务层。
pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CreateProjectResponse>>, ServiceError> {
    let Json(req) = payload?;
    req.validate()?;

    let response = state.project_service.create_project(req).await?;

    Ok(Json(ApiResponse::success(response)))
}
