//! # GameStats Proxy
//!
//! 游戏统计聚合代理：把 Fortnite 与 Roblox 的公开 API 聚合为两个 JSON 函数

pub mod config;
pub mod error;
pub mod fortnite;
pub mod function;
pub mod logging;
pub mod roblox;
pub mod server;
pub mod upstream;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{ProxyError, Result};
pub use function::EdgeFunction;
pub use server::FunctionServer;
