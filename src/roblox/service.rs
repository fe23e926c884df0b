//! # Roblox 用户/游戏聚合服务
//!
//! `user` 先解析用户名，再并发拉取资料、三个社交计数和库存，汇总为一条记录；
//! 用户名解析失败时不会发出任何后续请求。

use super::types::{
    AggregatedProfile, InventorySummary, POPULAR_GAMES_LIMIT, ProfileDetails, ResolvedUser,
    RobloxOperation, RobloxRequest, UsernameLookup, is_numeric_query, read_count, take_array,
};
use crate::config::RobloxConfig;
use crate::error::{Context, ProxyError, Result};
use crate::function::{EdgeFunction, non_blank};
use crate::logging::{LogComponent, LogStage};
use crate::upstream::{UpstreamClient, join_url};
use crate::{invalid_request, ldebug, linfo, lwarn, not_found};
use async_trait::async_trait;
use serde_json::{Value, json};

/// 库存接口每页条数
const INVENTORY_PAGE_SIZE: &str = "50";

/// Roblox 用户与游戏查询
#[derive(Debug, Clone)]
pub struct RobloxService {
    client: UpstreamClient,
    endpoints: RobloxConfig,
}

impl RobloxService {
    #[must_use]
    pub const fn new(client: UpstreamClient, endpoints: RobloxConfig) -> Self {
        Self { client, endpoints }
    }

    /// 按操作类型分发
    pub async fn dispatch(&self, request_id: &str, request: RobloxRequest) -> Result<Value> {
        let operation = RobloxOperation::parse(request.kind.as_deref())?;
        ldebug!(
            request_id,
            LogStage::RequestStart,
            LogComponent::Roblox,
            "dispatch",
            &format!("roblox operation: {operation}")
        );

        match operation {
            RobloxOperation::User => {
                let username = required_query(request.query.as_deref())?;
                let profile = self.lookup_user(request_id, username).await?;
                Ok(serde_json::to_value(profile)?)
            }
            RobloxOperation::Game => {
                let query = required_query(request.query.as_deref())?;
                self.lookup_game(request_id, query).await
            }
            RobloxOperation::Popular => {
                let games = self.popular_games(request_id).await?;
                Ok(Value::Array(games))
            }
        }
    }

    /// 用户聚合：解析用户名 → 并发拉取五个子请求 → 汇总
    pub async fn lookup_user(&self, request_id: &str, username: &str) -> Result<AggregatedProfile> {
        let user = self
            .resolve_username(request_id, username)
            .await?
            .ok_or_else(|| not_found!("User not found"))?;

        let user_id = user.id.to_string();
        let users = &self.endpoints.users_base_url;
        let friends = &self.endpoints.friends_base_url;
        let inventory = &self.endpoints.inventory_base_url;

        let profile_url = join_url(users, &format!("/v1/users/{user_id}"));
        let friends_url = join_url(friends, &format!("/v1/users/{user_id}/friends/count"));
        let followers_url = join_url(friends, &format!("/v1/users/{user_id}/followers/count"));
        let following_url = join_url(friends, &format!("/v1/users/{user_id}/followings/count"));
        let inventory_url = join_url(
            inventory,
            &format!("/v1/users/{user_id}/assets/collectibles"),
        );
        let inventory_query = [("limit", INVENTORY_PAGE_SIZE), ("sortOrder", "Desc")];

        // 五个请求互不依赖，全部完成后再汇总
        let (profile, friends_count, followers_count, following_count, mut inventory_payload) = tokio::try_join!(
            async {
                self.client
                    .get_json(request_id, &profile_url, &[])
                    .await
                    .context("fetch user profile")
            },
            async {
                self.client
                    .get_json(request_id, &friends_url, &[])
                    .await
                    .context("fetch friends count")
            },
            async {
                self.client
                    .get_json(request_id, &followers_url, &[])
                    .await
                    .context("fetch followers count")
            },
            async {
                self.client
                    .get_json(request_id, &following_url, &[])
                    .await
                    .context("fetch following count")
            },
            async {
                self.client
                    .get_json(request_id, &inventory_url, &inventory_query)
                    .await
                    .context("fetch collectibles inventory")
            },
        )?;

        let details = ProfileDetails::from_payload(&profile);
        let summary = InventorySummary::from_payload(&mut inventory_payload);

        linfo!(
            request_id,
            LogStage::Response,
            LogComponent::Roblox,
            "user_aggregated",
            &format!("aggregated user {} ({})", user.name, user.id),
            rap = summary.total_rap,
            inventory_sample = summary.sample.len()
        );

        let ResolvedUser {
            id,
            name,
            display_name,
        } = user;
        Ok(AggregatedProfile {
            id,
            username: name,
            display_name,
            description: details.description,
            created: details.created,
            friends: read_count(&friends_count),
            followers: read_count(&followers_count),
            following: read_count(&following_count),
            rap: summary.total_rap,
            inventory: summary.sample,
        })
    }

    /// 批量用户名查询（排除封禁账号），返回第一个匹配
    async fn resolve_username(
        &self,
        request_id: &str,
        username: &str,
    ) -> Result<Option<ResolvedUser>> {
        let url = join_url(&self.endpoints.users_base_url, "/v1/usernames/users");
        let body = json!({
            "usernames": [username],
            "excludeBannedUsers": true,
        });
        let payload = self
            .client
            .post_json(request_id, &url, &body)
            .await
            .context("resolve username")?;

        let lookup: UsernameLookup = serde_json::from_value(payload).map_err(|e| {
            ProxyError::upstream_response_with_source("Unexpected username lookup response", e)
        })?;
        Ok(lookup.into_first())
    }

    /// 游戏查询：关键字搜索，无结果且为数字时按 universe id 兜底
    pub async fn lookup_game(&self, request_id: &str, query: &str) -> Result<Value> {
        let list_url = join_url(&self.endpoints.games_base_url, "/v1/games/list");
        let mut search = self
            .client
            .get_json(request_id, &list_url, &[("keyword", query), ("maxRows", "1")])
            .await
            .context("search games")?;

        let Some(hit) = take_array(&mut search, "games").into_iter().next() else {
            if is_numeric_query(query) {
                ldebug!(
                    request_id,
                    LogStage::ExternalApi,
                    LogComponent::Roblox,
                    "universe_fallback",
                    &format!("keyword search empty, trying universe id {}", query.trim())
                );
                return self
                    .universe_detail(request_id, query.trim())
                    .await
                    .context("fetch game by universe id")?
                    .ok_or_else(|| not_found!("Game not found"));
            }
            return Err(not_found!("Game not found"));
        };

        let Some(universe_id) = universe_id_of(&hit) else {
            return Ok(hit);
        };

        // 详情失败或为空时退回搜索结果
        match self.universe_detail(request_id, &universe_id).await {
            Ok(Some(detail)) => Ok(detail),
            Ok(None) => Ok(hit),
            Err(error) => {
                lwarn!(
                    request_id,
                    LogStage::ExternalApi,
                    LogComponent::Roblox,
                    "game_detail_failed",
                    &format!("detail lookup for universe {universe_id} failed, using search hit: {error}")
                );
                Ok(hit)
            }
        }
    }

    /// 按 universe id 查询游戏详情，返回第一条
    async fn universe_detail(&self, request_id: &str, universe_id: &str) -> Result<Option<Value>> {
        let url = join_url(&self.endpoints.games_base_url, "/v1/games");
        let mut payload = self
            .client
            .get_json(request_id, &url, &[("universeIds", universe_id)])
            .await?;
        Ok(take_array(&mut payload, "data").into_iter().next())
    }

    /// 热门游戏，最多 12 条；空列表是合法结果
    pub async fn popular_games(&self, request_id: &str) -> Result<Vec<Value>> {
        let url = join_url(&self.endpoints.games_base_url, "/v1/games/list");
        let limit = POPULAR_GAMES_LIMIT.to_string();
        let mut payload = self
            .client
            .get_json(
                request_id,
                &url,
                &[("sortToken", ""), ("gameFilter", "1"), ("maxRows", &limit)],
            )
            .await
            .context("fetch popular games")?;

        let mut games = take_array(&mut payload, "games");
        games.truncate(POPULAR_GAMES_LIMIT);
        Ok(games)
    }
}

#[async_trait]
impl EdgeFunction for RobloxService {
    fn name(&self) -> &'static str {
        "roblox-api"
    }

    async fn invoke(&self, request_id: &str, body: Value) -> Result<Value> {
        let request: RobloxRequest = serde_json::from_value(body)
            .map_err(|e| ProxyError::invalid_request(format!("Invalid request body: {e}")))?;
        self.dispatch(request_id, request).await
    }
}

fn required_query(query: Option<&str>) -> Result<&str> {
    non_blank(query).ok_or_else(|| invalid_request!("query is required"))
}

/// 搜索结果中的 universe id，数字或字符串均可
fn universe_id_of(hit: &Value) -> Option<String> {
    match hit.get("universeId")? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}
