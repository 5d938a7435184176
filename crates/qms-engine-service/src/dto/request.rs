//! 请求 DTO

use serde::Deserialize;
use validator::Validate;

/// 创建项目请求
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 5, max = 50, message = "项目名称长度必须在5-50个字符之间"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
