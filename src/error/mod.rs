//! # 错误处理
//!
//! 所有函数与上游调用共用 [`ProxyError`]；HTTP 层按其状态码与分类生成响应信封与日志级别。

pub mod macros;
pub mod types;

pub use types::ProxyError;

/// 全局 `Result` 别名
pub type Result<T> = std::result::Result<T, ProxyError>;

/// 为失败的上游步骤附加说明，状态码与对外文本仍取自内层错误
pub trait Context<T> {
    /// 附加固定说明
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    /// 仅在失败时才构造说明
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: Into<ProxyError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|error| ProxyError::Context {
            context: context().to_string(),
            source: Box::new(error.into()),
        })
    }
}

/// 错误分类，决定日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 调用方的问题（未知操作、缺少参数、实体不存在），记 warn
    Client,
    /// 配置或上游的问题，记 error
    Server,
}
