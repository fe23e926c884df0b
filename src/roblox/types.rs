//! # Roblox 请求与聚合结果类型

use crate::error::{ProxyError, Result};
use crate::function::lenient_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 展示用库存样本的最大条数
pub const INVENTORY_SAMPLE_SIZE: usize = 12;
/// 热门游戏列表的最大条数
pub const POPULAR_GAMES_LIMIT: usize = 12;

/// `roblox-api` 函数的请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RobloxRequest {
    /// 操作类型：`user` | `game` | `popular`
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    /// 用户名、游戏关键字或 universe id
    #[serde(default, deserialize_with = "lenient_text")]
    pub query: Option<String>,
}

/// 支持的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobloxOperation {
    User,
    Game,
    Popular,
}

impl RobloxOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Game => "game",
            Self::Popular => "popular",
        }
    }

    /// 从可选的类型字段解析，缺失或未知都是无效请求
    pub fn parse(kind: Option<&str>) -> Result<Self> {
        kind.map_or_else(|| Err(invalid_type()), str::parse::<Self>)
    }
}

impl FromStr for RobloxOperation {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "game" => Ok(Self::Game),
            "popular" => Ok(Self::Popular),
            _ => Err(invalid_type()),
        }
    }
}

impl fmt::Display for RobloxOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid_type() -> ProxyError {
    ProxyError::invalid_request("Invalid request type")
}

/// 用户名批量查询的响应，`data` 缺失或为 `null` 都视为没有匹配
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsernameLookup {
    #[serde(default)]
    pub data: Option<Vec<ResolvedUser>>,
}

impl UsernameLookup {
    /// 第一个匹配的账号
    #[must_use]
    pub fn into_first(self) -> Option<ResolvedUser> {
        self.data.unwrap_or_default().into_iter().next()
    }
}

/// 用户名解析出的账号
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedUser {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// 用户资料中本层读取的字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub description: Option<String>,
    pub created: Option<String>,
}

impl ProfileDetails {
    /// 从资料载荷读取，字段缺失或类型不符时为空
    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        let text = |field: &str| payload.get(field).and_then(Value::as_str).map(str::to_owned);
        Self {
            description: text("description"),
            created: text("created"),
        }
    }
}

/// 读取社交计数，缺失或非数字时为 0
#[must_use]
pub fn read_count(payload: &Value) -> u64 {
    payload.get("count").and_then(Value::as_u64).unwrap_or(0)
}

/// 一次库存拉取的汇总：总 RAP 覆盖全部条目，样本只截取前若干条
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySummary {
    pub total_rap: u64,
    pub sample: Vec<Value>,
}

impl InventorySummary {
    /// 从同一批条目同时计算总 RAP 与展示样本
    #[must_use]
    pub fn from_items(items: Vec<Value>) -> Self {
        let total_rap = items
            .iter()
            .map(recent_average_price)
            .fold(0, u64::saturating_add);
        let mut sample = items;
        sample.truncate(INVENTORY_SAMPLE_SIZE);
        Self { total_rap, sample }
    }

    /// 从库存接口载荷的 `data` 数组构建
    #[must_use]
    pub fn from_payload(payload: &mut Value) -> Self {
        Self::from_items(take_array(payload, "data"))
    }
}

/// 单个藏品的 RAP，小数四舍五入；缺失、负数或非数字时计 0
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn recent_average_price(item: &Value) -> u64 {
    let Some(price) = item.get("recentAveragePrice") else {
        return 0;
    };
    price.as_u64().unwrap_or_else(|| {
        price
            .as_f64()
            .filter(|value| value.is_finite() && *value > 0.0)
            // `as` 对超出范围的浮点数取饱和值
            .map_or(0, |value| value.round() as u64)
    })
}

/// 取出载荷中指定字段的数组，缺失或类型不符时为空
pub fn take_array(payload: &mut Value, field: &str) -> Vec<Value> {
    match payload.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// `user` 操作返回给前端的聚合记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedProfile {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub description: Option<String>,
    pub created: Option<String>,
    pub friends: u64,
    pub followers: u64,
    pub following: u64,
    pub rap: u64,
    pub inventory: Vec<Value>,
}

/// 查询是否为纯数字（可作为 universe id 直接查询）
#[must_use]
pub fn is_numeric_query(query: &str) -> bool {
    let query = query.trim();
    !query.is_empty() && query.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("user", RobloxOperation::User)]
    #[case("game", RobloxOperation::Game)]
    #[case("popular", RobloxOperation::Popular)]
    fn parse_known_operations(#[case] kind: &str, #[case] expected: RobloxOperation) {
        assert_eq!(RobloxOperation::parse(Some(kind)).unwrap(), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("friends"))]
    fn parse_unknown_operations(#[case] kind: Option<&str>) {
        let err = RobloxOperation::parse(kind).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidRequest { .. }));
    }

    #[rstest]
    #[case("920587237", true)]
    #[case(" 42 ", true)]
    #[case("", false)]
    #[case("   ", false)]
    #[case("Adopt Me", false)]
    #[case("12abc", false)]
    #[case("-5", false)]
    #[case("1.5", false)]
    fn numeric_query_detection(#[case] query: &str, #[case] expected: bool) {
        assert_eq!(is_numeric_query(query), expected);
    }

    #[test]
    fn request_accepts_numeric_query() {
        let request: RobloxRequest =
            serde_json::from_value(json!({"type": "game", "query": 1818})).unwrap();
        assert_eq!(request.query.as_deref(), Some("1818"));
    }

    #[test]
    fn missing_price_contributes_zero() {
        let summary = InventorySummary::from_items(vec![
            json!({"recentAveragePrice": 1000}),
            json!({"name": "no price"}),
            json!({"recentAveragePrice": null}),
            json!({"recentAveragePrice": 2000}),
        ]);
        assert_eq!(summary.total_rap, 3000);
        assert_eq!(summary.sample.len(), 4);
    }

    #[test]
    fn total_rap_saturates_instead_of_overflowing() {
        let summary = InventorySummary::from_items(vec![
            json!({"recentAveragePrice": u64::MAX}),
            json!({"recentAveragePrice": 1}),
        ]);
        assert_eq!(summary.total_rap, u64::MAX);
        assert_eq!(summary.sample.len(), 2);
    }

    #[rstest]
    #[case(json!({"recentAveragePrice": 1500.0}), 1500)]
    #[case(json!({"recentAveragePrice": 99.6}), 100)]
    #[case(json!({"recentAveragePrice": -20}), 0)]
    #[case(json!({"recentAveragePrice": "1200"}), 0)]
    #[case(json!({"recentAveragePrice": 1e30}), u64::MAX)]
    fn price_accepts_any_positive_number(#[case] item: Value, #[case] expected: u64) {
        assert_eq!(recent_average_price(&item), expected);
    }

    #[rstest]
    #[case(json!({"data": null}))]
    #[case(json!({}))]
    #[case(json!({"data": []}))]
    fn username_lookup_without_matches_is_empty(#[case] payload: Value) {
        let lookup: UsernameLookup = serde_json::from_value(payload).unwrap();
        assert!(lookup.into_first().is_none());
    }

    #[test]
    fn from_payload_reads_data_array() {
        let mut payload = json!({"previousPageCursor": null, "data": [{"recentAveragePrice": 5}]});
        let summary = InventorySummary::from_payload(&mut payload);
        assert_eq!(summary.total_rap, 5);

        let summary = InventorySummary::from_payload(&mut json!({"errors": []}));
        assert_eq!(summary, InventorySummary::default());
    }

    #[test]
    fn profile_and_counts_are_lenient() {
        let details = ProfileDetails::from_payload(&json!({"created": "2006-01-01", "description": 3}));
        assert_eq!(details.created.as_deref(), Some("2006-01-01"));
        assert_eq!(details.description, None);

        assert_eq!(read_count(&json!({"count": 5})), 5);
        assert_eq!(read_count(&json!({"errors": [{"code": 0}]})), 0);
        assert_eq!(read_count(&json!({"count": "many"})), 0);
    }

    #[test]
    fn aggregated_profile_uses_front_end_field_names() {
        let profile = AggregatedProfile {
            id: 1,
            username: "builderman".to_string(),
            display_name: "builderman".to_string(),
            description: None,
            created: Some("2006-01-01".to_string()),
            friends: 5,
            followers: 100,
            following: 3,
            rap: 0,
            inventory: Vec::new(),
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["displayName"], "builderman");
        assert_eq!(value["description"], Value::Null);
        assert_eq!(value["created"], "2006-01-01");
    }

    proptest! {
        #[test]
        fn summary_total_covers_all_items_and_sample_is_prefix(
            prices in proptest::collection::vec(proptest::option::of(0u32..100_000), 0..60)
        ) {
            let items: Vec<Value> = prices
                .iter()
                .enumerate()
                .map(|(index, price)| match price {
                    Some(price) => json!({"assetId": index, "recentAveragePrice": price}),
                    None => json!({"assetId": index}),
                })
                .collect();
            let expected_total: u64 = prices.iter().flatten().map(|p| u64::from(*p)).sum();

            let summary = InventorySummary::from_items(items.clone());

            prop_assert_eq!(summary.total_rap, expected_total);
            prop_assert!(summary.sample.len() <= INVENTORY_SAMPLE_SIZE);
            prop_assert_eq!(summary.sample.len(), items.len().min(INVENTORY_SAMPLE_SIZE));
            prop_assert_eq!(&summary.sample[..], &items[..summary.sample.len()]);
        }
    }
}
