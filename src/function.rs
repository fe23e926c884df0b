//! # 函数抽象
//!
//! 每个聚合服务对外表现为一个“函数”：接收一个 JSON 对象，返回一个 JSON 载荷。

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 一个可被 HTTP 层调用的聚合函数
#[async_trait]
pub trait EdgeFunction: Send + Sync {
    /// 函数名，同时作为路由路径的最后一段
    fn name(&self) -> &'static str;

    /// 处理一次调用，`body` 已确认是 JSON 对象
    async fn invoke(&self, request_id: &str, body: Value) -> Result<Value>;
}

/// 把字符串或数字字段宽松地读成文本，其余类型视为缺失
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// 去掉首尾空白后非空的文本
pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_text")]
        query: Option<String>,
    }

    #[test]
    fn lenient_text_accepts_strings_and_numbers() {
        let probe: Probe = serde_json::from_value(json!({"query": "builderman"})).unwrap();
        assert_eq!(probe.query.as_deref(), Some("builderman"));

        let probe: Probe = serde_json::from_value(json!({"query": 920587237})).unwrap();
        assert_eq!(probe.query.as_deref(), Some("920587237"));
    }

    #[test]
    fn lenient_text_treats_other_types_as_missing() {
        for value in [json!({}), json!({"query": null}), json!({"query": [1]}), json!({"query": true})] {
            let probe: Probe = serde_json::from_value(value).unwrap();
            assert_eq!(probe.query, None);
        }
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  a ")), Some("a"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
