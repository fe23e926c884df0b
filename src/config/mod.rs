//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod manager;

pub use app_config::{AppConfig, FortniteConfig, RobloxConfig, ServerConfig, UpstreamConfig};
pub use manager::ConfigManager;

use crate::ensure_config;
use crate::error::Result;
use url::Url;

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // 验证服务器配置
    ensure_config!(config.server.port != 0, "无效的服务器端口: {}", config.server.port);
    ensure_config!(
        config.server.api_prefix.starts_with('/'),
        "函数路由前缀必须以 / 开头: {}",
        config.server.api_prefix
    );
    ensure_config!(config.server.max_request_size > 0, "最大请求体大小必须大于0");

    // 验证上游配置
    ensure_config!(config.upstream.timeout_seconds > 0, "上游超时时间必须大于0");
    ensure_config!(
        config.upstream.connect_timeout_seconds > 0,
        "上游连接超时时间必须大于0"
    );

    validate_base_url("fortnite.base_url", &config.fortnite.base_url)?;
    for (name, url) in config.roblox.endpoints() {
        validate_base_url(name, url)?;
    }

    Ok(())
}

fn validate_base_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| {
        crate::error::ProxyError::config_with_source(format!("无效的上游地址 {name}: {value}"), e)
    })?;
    ensure_config!(
        matches!(url.scheme(), "http" | "https"),
        "上游地址 {} 只支持 http/https: {}",
        name,
        value
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(matches!(validate_config(&config), Err(ProxyError::Config { .. })));
    }

    #[test]
    fn prefix_without_slash_is_rejected() {
        let mut config = AppConfig::default();
        config.server.api_prefix = "functions".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = AppConfig::default();
        config.upstream.timeout_seconds = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn non_http_upstream_is_rejected() {
        let mut config = AppConfig::default();
        config.roblox.games_base_url = "ftp://games.roblox.com".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("roblox.games_base_url"));

        config.roblox.games_base_url = "not a url".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn missing_api_key_is_not_a_startup_error() {
        let config = AppConfig::default();
        assert!(config.fortnite.api_key().is_none());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut config = AppConfig::default();
        config.fortnite.api_key = Some("   ".to_string());
        assert!(config.fortnite.api_key().is_none());
    }

    #[test]
    fn masked_config_hides_api_key() {
        let mut config = AppConfig::default();
        config.fortnite.api_key = Some("secret".to_string());
        assert_eq!(config.masked().fortnite.api_key.as_deref(), Some("***"));
        assert_eq!(config.fortnite.api_key.as_deref(), Some("secret"));
    }
}
