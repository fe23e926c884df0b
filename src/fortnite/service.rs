//! # Fortnite 聚合服务
//!
//! 每个操作只转发到一个上游端点。只有 `stats` 需要 API Key，
//! 缺失时在发出任何网络请求之前就失败。

use super::types::{FortniteOperation, FortniteRequest};
use crate::config::FortniteConfig;
use crate::error::{Context, ProxyError, Result};
use crate::function::{EdgeFunction, non_blank};
use crate::logging::{LogComponent, LogStage};
use crate::upstream::{UpstreamClient, join_url};
use crate::{config_error, invalid_request, ldebug, linfo, not_found};
use async_trait::async_trait;
use serde_json::{Map, Value};

const STATS_PATH: &str = "/v2/stats/br/v2";
const SHOP_PATH: &str = "/v2/shop/br";
const COSMETICS_SEARCH_PATH: &str = "/v2/cosmetics/br/search/all";

/// Fortnite 玩家统计 / 商店 / 外观搜索
#[derive(Debug, Clone)]
pub struct FortniteService {
    client: UpstreamClient,
    config: FortniteConfig,
}

impl FortniteService {
    #[must_use]
    pub const fn new(client: UpstreamClient, config: FortniteConfig) -> Self {
        Self { client, config }
    }

    /// 按操作类型分发
    pub async fn dispatch(&self, request_id: &str, request: FortniteRequest) -> Result<Value> {
        let operation = FortniteOperation::parse(request.kind.as_deref())?;
        ldebug!(
            request_id,
            LogStage::RequestStart,
            LogComponent::Fortnite,
            "dispatch",
            &format!("fortnite operation: {operation}")
        );

        match operation {
            FortniteOperation::Stats => {
                // 先检查凭据，再检查参数
                let api_key = self
                    .config
                    .api_key()
                    .ok_or_else(|| config_error!("FORTNITE_API_KEY is not configured"))?;
                let username = required_username(request.username.as_deref())?;
                self.player_stats(request_id, username, api_key).await
            }
            FortniteOperation::Shop => self.item_shop(request_id).await,
            FortniteOperation::Cosmetics => {
                let name = required_username(request.username.as_deref())?;
                self.search_cosmetics(request_id, name).await
            }
        }
    }

    /// 玩家战绩；载荷中的 `status` 不是 200 即视为玩家不存在
    pub async fn player_stats(
        &self,
        request_id: &str,
        username: &str,
        api_key: &str,
    ) -> Result<Value> {
        let url = join_url(&self.config.base_url, STATS_PATH);
        let mut body = self
            .client
            .get_json_with_key(request_id, &url, &[("name", username)], api_key)
            .await
            .context("fetch player stats")?;

        if body.get("status").and_then(Value::as_u64) != Some(200) {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .unwrap_or("Player not found");
            return Err(not_found!(message));
        }

        linfo!(
            request_id,
            LogStage::Response,
            LogComponent::Fortnite,
            "player_stats",
            &format!("stats resolved for {username}")
        );
        Ok(take_data(&mut body).unwrap_or(Value::Null))
    }

    /// 当日商店，空载荷也算成功，返回 `{}`
    pub async fn item_shop(&self, request_id: &str) -> Result<Value> {
        let url = join_url(&self.config.base_url, SHOP_PATH);
        let mut body = self
            .client
            .get_json(request_id, &url, &[])
            .await
            .context("fetch item shop")?;

        Ok(take_data(&mut body).unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// 按名称子串搜索外观，无结果时返回 `[]`
    pub async fn search_cosmetics(&self, request_id: &str, name: &str) -> Result<Value> {
        let url = join_url(&self.config.base_url, COSMETICS_SEARCH_PATH);
        let query = [("matchMethod", "contains"), ("name", name), ("language", "en")];
        let mut body = self
            .client
            .get_json(request_id, &url, &query)
            .await
            .context("search cosmetics")?;

        Ok(take_data(&mut body).unwrap_or_else(|| Value::Array(Vec::new())))
    }
}

#[async_trait]
impl EdgeFunction for FortniteService {
    fn name(&self) -> &'static str {
        "fortnite-api"
    }

    async fn invoke(&self, request_id: &str, body: Value) -> Result<Value> {
        let request: FortniteRequest = serde_json::from_value(body)
            .map_err(|e| ProxyError::invalid_request(format!("Invalid request body: {e}")))?;
        self.dispatch(request_id, request).await
    }
}

fn required_username(username: Option<&str>) -> Result<&str> {
    non_blank(username).ok_or_else(|| invalid_request!("username is required"))
}

/// 取出上游载荷的 `data` 字段，`null` 视为缺失
fn take_data(body: &mut Value) -> Option<Value> {
    body.get_mut("data")
        .map(Value::take)
        .filter(|data| !data.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn take_data_ignores_null() {
        assert_eq!(take_data(&mut json!({"data": null})), None);
        assert_eq!(take_data(&mut json!({})), None);
        assert_eq!(take_data(&mut json!({"data": {"a": 1}})), Some(json!({"a": 1})));
    }

    #[test]
    fn required_username_rejects_blank() {
        assert!(required_username(Some("  ")).is_err());
        assert!(required_username(None).is_err());
        assert_eq!(required_username(Some(" Ninja ")).unwrap(), "Ninja");
    }
}
