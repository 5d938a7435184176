//! 路由配置模块

use axum::{Router, routing::post};

use crate::{handlers, state::AppState};

/// 业务 API 路由，挂载在 `/v1` 下
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/project", post(handlers::project::create_project))
}
