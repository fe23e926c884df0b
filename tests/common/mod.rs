//! 集成测试公共工具：指向 wiremock 的配置与路由驱动
#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use gamestats_proxy::FunctionServer;
use gamestats_proxy::config::{AppConfig, RobloxConfig};
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

pub const FORTNITE_PATH: &str = "/functions/v1/fortnite-api";
pub const ROBLOX_PATH: &str = "/functions/v1/roblox-api";

/// 所有上游都指向同一个 mock 服务器
pub fn config_for(server: &MockServer, api_key: Option<&str>) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.timeout_seconds = 2;
    config.fortnite.base_url = server.uri();
    config.fortnite.api_key = api_key.map(ToString::to_string);
    config.roblox = RobloxConfig::single_host(&server.uri());
    config
}

pub fn router_for(config: &AppConfig) -> Router {
    FunctionServer::new(config).unwrap().router()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.raw).unwrap()
    }
}

pub async fn request(router: Router, method: Method, path: &str, body: &str) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let raw = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        raw,
    }
}

/// POST 一个 JSON 请求体，返回状态码与解析后的信封
pub async fn call(router: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = request(router, Method::POST, path, &body.to_string()).await;
    let json = response.json();
    (response.status, json)
}
