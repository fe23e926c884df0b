//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务器配置
    pub server: ServerConfig,
    /// 上游调用配置
    pub upstream: UpstreamConfig,
    /// Fortnite 统计接口配置
    pub fortnite: FortniteConfig,
    /// Roblox 接口配置
    pub roblox: RobloxConfig,
}

/// HTTP 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 函数路由前缀
    pub api_prefix: String,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_prefix: "/functions/v1".to_string(),
            cors_origins: vec!["*".to_string()],
            max_request_size: 64 * 1024,
        }
    }
}

/// 上游调用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// 单次上游调用的总超时（秒）
    pub timeout_seconds: u64,
    /// 建立连接超时（秒）
    pub connect_timeout_seconds: u64,
    /// 发往上游的 User-Agent
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            connect_timeout_seconds: 5,
            user_agent: concat!("gamestats-proxy/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Fortnite 统计接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FortniteConfig {
    /// fortnite-api.com 根地址
    pub base_url: String,
    /// 战绩查询所需的 API Key，只有 `stats` 操作需要
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for FortniteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fortnite-api.com".to_string(),
            api_key: None,
        }
    }
}

impl FortniteConfig {
    /// 返回非空的 API Key
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Roblox 接口配置，每个子域名单独可配
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobloxConfig {
    pub users_base_url: String,
    pub friends_base_url: String,
    pub inventory_base_url: String,
    pub games_base_url: String,
}

impl Default for RobloxConfig {
    fn default() -> Self {
        Self {
            users_base_url: "https://users.roblox.com".to_string(),
            friends_base_url: "https://friends.roblox.com".to_string(),
            inventory_base_url: "https://inventory.roblox.com".to_string(),
            games_base_url: "https://games.roblox.com".to_string(),
        }
    }
}

impl RobloxConfig {
    /// 所有上游地址 (名称, 地址)
    #[must_use]
    pub fn endpoints(&self) -> [(&'static str, &str); 4] {
        [
            ("roblox.users_base_url", self.users_base_url.as_str()),
            ("roblox.friends_base_url", self.friends_base_url.as_str()),
            ("roblox.inventory_base_url", self.inventory_base_url.as_str()),
            ("roblox.games_base_url", self.games_base_url.as_str()),
        ]
    }

    /// 把所有上游指向同一个地址，测试时指向 mock 服务器
    #[must_use]
    pub fn single_host(base_url: &str) -> Self {
        Self {
            users_base_url: base_url.to_string(),
            friends_base_url: base_url.to_string(),
            inventory_base_url: base_url.to_string(),
            games_base_url: base_url.to_string(),
        }
    }
}

impl AppConfig {
    /// 获取监听地址字符串
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 用于打印的配置副本，敏感字段被遮盖
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if copy.fortnite.api_key.is_some() {
            copy.fortnite.api_key = Some("***".to_string());
        }
        copy
    }
}
