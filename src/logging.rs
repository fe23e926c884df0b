//! # 日志配置模块
//!
//! 提供日志初始化以及带阶段/组件标签的结构化日志宏

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 请求处理所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    RequestStart,
    UpstreamRequest,
    ExternalApi,
    Response,
    ResponseFailure,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::RequestStart => "request_start",
            Self::UpstreamRequest => "upstream_request",
            Self::ExternalApi => "external_api",
            Self::Response => "response",
            Self::ResponseFailure => "response_failure",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    ServerSetup,
    Config,
    Upstream,
    Fortnite,
    Roblox,
    Handler,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Config => "config",
            Self::Upstream => "upstream",
            Self::Fortnite => "fortnite",
            Self::Roblox => "roblox",
            Self::Handler => "handler",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 info 日志
///
/// 参数顺序：`request_id, stage, component, operation, message[, field = value...]`
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            "{}",
            $message
        )
    };
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr, $($fields:tt)+) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($fields)+,
            "{}",
            $message
        )
    };
}

/// 初始化优化的日志系统
pub fn init_optimized_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");

    // 默认配置：应用自身 debug，HTTP 栈只保留警告
    let default_filter = format!("{level},gamestats_proxy=debug,hyper=warn,reqwest=warn");

    let log_filter = env::var("RUST_LOG").unwrap_or(default_filter);

    // try_init: 测试中可能被重复调用
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_and_component_render_snake_case() {
        assert_eq!(LogStage::UpstreamRequest.to_string(), "upstream_request");
        assert_eq!(LogStage::ResponseFailure.as_str(), "response_failure");
        assert_eq!(LogComponent::ServerSetup.to_string(), "server_setup");
        assert_eq!(LogComponent::Roblox.as_str(), "roblox");
    }

    #[test]
    fn macros_accept_extra_fields() {
        init_optimized_logging(Some("debug"));
        let user_id = 42_u64;
        linfo!("test", LogStage::Response, LogComponent::Roblox, "op", "plain");
        ldebug!(
            "test",
            LogStage::ExternalApi,
            LogComponent::Upstream,
            "op",
            &format!("user {user_id}"),
            user_id = user_id
        );
        lwarn!("test", LogStage::ResponseFailure, LogComponent::Handler, "op", "warned",);
        lerror!("test", LogStage::ResponseFailure, LogComponent::Main, "op", "failed", code = "X");
    }
}
