//! 服务错误类型定义
//!
//! 工作流对外只暴露三类错误：请求无效、操作被禁止（名称冲突）、内部错误。
//! 仓储和数据库的原始错误只写日志，不返回给调用方。

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

/// 字段级错误详情
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub error_code: String,
    pub message: String,
    pub path: String,
}

/// 服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("请求参数无效")]
    BadRequest(Vec<ErrorDetail>),

    #[error("操作被禁止: {0}")]
    Forbidden(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl ServiceError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let (message, errors) = match self {
            Self::BadRequest(details) => ("请求参数无效".to_string(), details),
            Self::Forbidden(reason) => (reason, Vec::new()),
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                ("服务内部错误，请稍后重试".to_string(), Vec::new())
            }
        };

        let body = json!({
            "success": false,
            "code": code,
            "message": message,
            "data": serde_json::Value::Null,
            "errors": errors,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换，每个字段错误对应一条详情
impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| ErrorDetail {
                    error_code: "VALIDATION_ERROR".to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("字段 '{}' 校验失败: {}", field, e.code)),
                    path: field.to_string(),
                })
            })
            .collect();
        details.sort_by(|a, b| a.path.cmp(&b.path));

        Self::BadRequest(details)
    }
}

/// 请求体无法解析为 JSON 或缺少必填字段
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(vec![ErrorDetail {
            error_code: "INVALID_BODY".to_string(),
            message: rejection.body_text(),
            path: String::new(),
        }])
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ServiceError>;
