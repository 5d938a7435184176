//! QMS 引擎服务
//!
//! 提供项目创建 REST API。

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, middleware, routing::get};
use qms_engine::{AppState, Project, ProjectService, routes};
use qms_repository::Repository;
use qms_shared::{
    DbConnections,
    config::AppConfig,
    observability::{self, middleware as obs_middleware},
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("qms-engine-service")?;

    let _guard = observability::init(&config.observability).await?;

    info!(
        environment = %config.environment,
        "Starting qms-engine-service on {}",
        config.server_addr()
    );

    let db = DbConnections::connect(&config.database).await?;

    let project_service = Arc::new(ProjectService::new(Repository::<Project>::new(db.clone())));
    let state = AppState::new(project_service);

    // 超时后请求 future 被丢弃，未提交的事务随之回滚
    let request_timeout = Duration::from_secs(config.server.request_timeout_seconds);

    let app = Router::new()
        .nest("/v1", routes::api_routes())
        .with_state(state)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check).with_state(db.clone()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号（SIGTERM 或 Ctrl+C）
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "qms-engine-service"
    }))
}

/// 就绪探针：依次探测 master 和 replica
async fn readiness_check(State(db): State<DbConnections>) -> Json<serde_json::Value> {
    let db_ok = match db.health_check().await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Database readiness check failed");
            false
        }
    };

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "qms-engine-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" }
        }
    }))
}
