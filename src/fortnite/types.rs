//! # Fortnite 请求类型

use crate::error::{ProxyError, Result};
use crate::function::lenient_text;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// `fortnite-api` 函数的请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FortniteRequest {
    /// 操作类型：`stats` | `shop` | `cosmetics`
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    /// 玩家名；`cosmetics` 时作为名称搜索词
    #[serde(default, deserialize_with = "lenient_text")]
    pub username: Option<String>,
}

/// 支持的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FortniteOperation {
    Stats,
    Shop,
    Cosmetics,
}

impl FortniteOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::Shop => "shop",
            Self::Cosmetics => "cosmetics",
        }
    }

    /// 从可选的类型字段解析，缺失或未知都是无效请求
    pub fn parse(kind: Option<&str>) -> Result<Self> {
        kind.map_or_else(|| Err(invalid_type()), str::parse::<Self>)
    }
}

impl FromStr for FortniteOperation {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stats" => Ok(Self::Stats),
            "shop" => Ok(Self::Shop),
            "cosmetics" => Ok(Self::Cosmetics),
            _ => Err(invalid_type()),
        }
    }
}

impl fmt::Display for FortniteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid_type() -> ProxyError {
    ProxyError::invalid_request("Invalid request type")
}
