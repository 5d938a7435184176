//! 基础设施错误处理模块
//!
//! 配置加载与连接池初始化阶段的错误类型，使用 thiserror 提供良好的错误信息。
//! 业务侧的错误分类由仓储层和服务层各自定义。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("数据库连接失败: {role} - {source}")]
    Connect {
        role: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("数据库健康检查失败: {role} - {source}")]
    HealthCheck {
        role: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("可观测性初始化失败: {0}")]
    Observability(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, InfraError>;

impl InfraError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Connect { .. } => "DATABASE_CONNECT_ERROR",
            Self::HealthCheck { .. } => "DATABASE_HEALTH_ERROR",
            Self::Observability(_) => "OBSERVABILITY_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = InfraError::Connect {
            role: "master",
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(err.code(), "DATABASE_CONNECT_ERROR");
        assert!(err.to_string().contains("master"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: InfraError = config::ConfigError::NotFound("database.master.url".into()).into();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
