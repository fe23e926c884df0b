//! # 配置管理器
//!
//! 统一的配置加载入口：配置文件 + 环境变量覆盖 + 校验

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use super::{AppConfig, validate_config};
use crate::error::{ProxyError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 环境变量覆盖前缀
pub const ENV_PREFIX: &str = "GAMESTATS_";
/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "GAMESTATS_CONFIG_PATH";
/// 兼容旧部署的 API Key 环境变量
pub const LEGACY_API_KEY_ENV: &str = "FORTNITE_API_KEY";

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 当前配置
    config: AppConfig,
    /// 配置文件来源，使用内置默认值时为空
    source: Option<PathBuf>,
    /// 生效的环境变量覆盖数量
    override_count: usize,
}

impl ConfigManager {
    /// 按 CLI 参数 → 环境变量 → 默认路径的顺序加载配置
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        Self::load_with_vars(explicit_path, env::vars())
    }

    /// 与 [`ConfigManager::load`] 相同，但环境变量由调用方提供
    pub fn load_with_vars<I>(explicit_path: Option<&Path>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let (mut config, source) = match explicit_path {
            Some(path) => (Self::load_config_file(path)?, Some(path.to_path_buf())),
            None => match vars.get(CONFIG_PATH_ENV) {
                Some(path) => {
                    let path = PathBuf::from(path);
                    (Self::load_config_file(&path)?, Some(path))
                }
                None => {
                    let rust_env = vars.get("RUST_ENV").map_or("dev", String::as_str);
                    let default_path = PathBuf::from(format!("config/config.{rust_env}.toml"));
                    if default_path.exists() {
                        (Self::load_config_file(&default_path)?, Some(default_path))
                    } else {
                        lwarn!(
                            "system",
                            LogStage::Configuration,
                            LogComponent::Config,
                            "config_file_missing",
                            &format!(
                                "配置文件 {} 不存在，使用内置默认配置",
                                default_path.display()
                            )
                        );
                        (AppConfig::default(), None)
                    }
                }
            },
        };

        let overrides = Self::build_env_overrides(vars);
        Self::apply_env_overrides(&mut config, &overrides)?;

        validate_config(&config)?;

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "config_loaded",
            "配置加载完成",
            source = %source
                .as_ref()
                .map_or_else(|| "<defaults>".to_string(), |p| p.display().to_string()),
            overrides = overrides.len(),
            fortnite_api_key = config.fortnite.api_key().is_some()
        );

        Ok(Self {
            config,
            source,
            override_count: overrides.len(),
        })
    }

    /// 获取当前配置
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 配置文件来源
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 生效的环境变量覆盖数量
    #[must_use]
    pub const fn override_count(&self) -> usize {
        self.override_count
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(ProxyError::config(format!(
                "配置文件不存在: {}",
                path.display()
            )));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            ProxyError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })
    }

    /// 构建环境变量覆盖映射
    fn build_env_overrides(vars: HashMap<String, String>) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut legacy_api_key = None;

        for (key, value) in vars {
            if key == CONFIG_PATH_ENV {
                continue;
            }
            if key == LEGACY_API_KEY_ENV {
                legacy_api_key = Some(value);
                continue;
            }
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                // 例如: GAMESTATS_SERVER_PORT -> server.port
                let config_path = config_key.to_lowercase().replace('_', ".");
                overrides.insert(config_path, value);
            }
        }

        // 带前缀的变量优先
        if let Some(value) = legacy_api_key {
            overrides
                .entry("fortnite.api.key".to_string())
                .or_insert(value);
        }

        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            ldebug!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "env_override",
                &format!(
                    "应用环境变量覆盖: {} = {}",
                    path,
                    if path.contains("key") || path.contains("secret") {
                        "***"
                    } else {
                        value.as_str()
                    }
                )
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => config.server.host = value.to_string(),
            ["server", "port"] => config.server.port = parse_number(value, "无效的端口号")?,
            ["server", "api", "prefix"] | ["server", "apiprefix"] => {
                config.server.api_prefix = value.to_string();
            }
            ["server", "cors", "origins"] | ["server", "corsorigins"] => {
                config.server.cors_origins = value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            ["server", "max", "request", "size"] | ["server", "maxrequestsize"] => {
                config.server.max_request_size = parse_number(value, "无效的最大请求体大小")?;
            }
            ["upstream", "timeout", "seconds"] | ["upstream", "timeout"] => {
                config.upstream.timeout_seconds = parse_number(value, "无效的上游超时时间")?;
            }
            ["upstream", "connect", "timeout", "seconds"] | ["upstream", "connecttimeout"] => {
                config.upstream.connect_timeout_seconds =
                    parse_number(value, "无效的上游连接超时时间")?;
            }
            ["upstream", "user", "agent"] | ["upstream", "useragent"] => {
                config.upstream.user_agent = value.to_string();
            }
            ["fortnite", "base", "url"] | ["fortnite", "baseurl"] => {
                config.fortnite.base_url = value.to_string();
            }
            ["fortnite", "api", "key"] | ["fortnite", "apikey"] => {
                config.fortnite.api_key = Some(value.to_string());
            }
            ["roblox", "users", "base", "url"] => config.roblox.users_base_url = value.to_string(),
            ["roblox", "friends", "base", "url"] => {
                config.roblox.friends_base_url = value.to_string();
            }
            ["roblox", "inventory", "base", "url"] => {
                config.roblox.inventory_base_url = value.to_string();
            }
            ["roblox", "games", "base", "url"] => config.roblox.games_base_url = value.to_string(),
            _ => {
                lwarn!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "unknown_override",
                    &format!("未知的配置路径，忽略环境变量覆盖: {path}")
                );
            }
        }

        Ok(())
    }
}

fn parse_number<T>(value: &str, what: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .map_err(|e| ProxyError::config_with_source(format!("{what}: {value}"), e))
}
