//! # 错误类型定义

use super::ErrorCategory;
use axum::http::StatusCode;
use thiserror::Error;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 配置相关错误（例如缺少上游凭据）
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 请求参数错误（未知的操作类型、缺少查询参数、请求体不是 JSON）
    #[error("请求无效: {message}")]
    InvalidRequest { message: String },

    /// 上游报告请求的实体不存在
    #[error("资源未找到: {message}")]
    NotFound { message: String },

    /// 网络通信错误
    #[error("网络错误: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 上游调用超时
    #[error("上游超时: {message}")]
    UpstreamTimeout {
        message: String,
        timeout_seconds: u64,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 上游返回了无法解析的响应
    #[error("上游响应异常: {message}")]
    UpstreamResponse {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 服务器启动错误
    #[error("服务器启动错误: {message}")]
    ServerStart {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 带调用点上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ProxyError>,
    },
}

impl ProxyError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Network { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "NETWORK_ERROR"),
            Self::UpstreamTimeout { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_TIMEOUT"),
            Self::UpstreamResponse { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_RESPONSE_ERROR")
            }
            Self::Serialization { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::ServerStart { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_START_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// HTTP 状态码
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.to_http_response_parts().0
    }

    /// 错误分类，决定日志级别
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.status_code().is_client_error() {
            ErrorCategory::Client
        } else {
            ErrorCategory::Server
        }
    }

    /// 返回给调用方的错误文本（不带日志前缀与上下文）
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Config { message, .. }
            | Self::InvalidRequest { message }
            | Self::NotFound { message }
            | Self::Network { message, .. }
            | Self::UpstreamTimeout { message, .. }
            | Self::UpstreamResponse { message, .. }
            | Self::Serialization { message, .. }
            | Self::Internal { message, .. }
            | Self::Io { message, .. }
            | Self::ServerStart { message, .. } => message.clone(),
            Self::Context { source, .. } => source.client_message(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建请求无效错误
    pub fn invalid_request<T: Into<String>>(message: T) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// 创建带来源的网络错误
    pub fn network_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的上游超时错误
    pub fn upstream_timeout_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        timeout_seconds: u64,
        source: E,
    ) -> Self {
        Self::UpstreamTimeout {
            message: message.into(),
            timeout_seconds,
            source: Some(source.into()),
        }
    }

    /// 创建带来源的上游响应异常错误
    pub fn upstream_response_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::UpstreamResponse {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的服务器启动错误
    pub fn server_start_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}
