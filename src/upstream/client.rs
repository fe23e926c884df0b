//! # 上游 HTTP 客户端
//!
//! 对 reqwest 的薄封装：统一超时、User-Agent、错误映射与 JSON 解码。
//! 上游响应体无论 HTTP 状态码如何都按 JSON 解析，由调用方根据载荷判断结果。

use crate::config::UpstreamConfig;
use crate::error::{ProxyError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};
use reqwest::{Client, RequestBuilder, header};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// 上游 HTTP 客户端，整个进程共享一个连接池
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    timeout_seconds: u64,
}

impl UpstreamClient {
    /// 按配置构建客户端
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProxyError::internal_with_source("构建上游HTTP客户端失败", e))?;

        Ok(Self {
            http,
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// GET 并解析 JSON 响应
    pub async fn get_json(
        &self,
        request_id: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let builder = self.http.get(url).query(query);
        self.execute(request_id, "GET", url, builder).await
    }

    /// 携带 `Authorization` 凭据的 GET
    pub async fn get_json_with_key(
        &self,
        request_id: &str,
        url: &str,
        query: &[(&str, &str)],
        api_key: &str,
    ) -> Result<Value> {
        let builder = self
            .http
            .get(url)
            .query(query)
            .header(header::AUTHORIZATION, api_key);
        self.execute(request_id, "GET", url, builder).await
    }

    /// POST JSON 请求体并解析 JSON 响应
    pub async fn post_json<B>(&self, request_id: &str, url: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.http.post(url).json(body);
        self.execute(request_id, "POST", url, builder).await
    }

    async fn execute(
        &self,
        request_id: &str,
        method: &str,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<Value> {
        let started = Instant::now();
        ldebug!(
            request_id,
            LogStage::UpstreamRequest,
            LogComponent::Upstream,
            "upstream_request",
            &format!("{method} {url}")
        );

        let response = builder
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if status.is_success() {
            ldebug!(
                request_id,
                LogStage::ExternalApi,
                LogComponent::Upstream,
                "upstream_response",
                &format!("{method} {url} -> {status}"),
                elapsed_ms = elapsed_ms,
                bytes = body.len()
            );
        } else {
            lwarn!(
                request_id,
                LogStage::ExternalApi,
                LogComponent::Upstream,
                "upstream_non_success",
                &format!("{method} {url} -> {status}"),
                elapsed_ms = elapsed_ms
            );
        }

        serde_json::from_slice(&body).map_err(|e| {
            ProxyError::upstream_response_with_source(
                format!("Upstream returned a non-JSON response (HTTP {})", status.as_u16()),
                e,
            )
        })
    }

    fn map_transport_error(&self, url: &str, error: reqwest::Error) -> ProxyError {
        if error.is_timeout() {
            ProxyError::upstream_timeout_with_source(
                format!(
                    "Upstream request timed out after {}s: {}",
                    self.timeout_seconds,
                    strip_query(url)
                ),
                self.timeout_seconds,
                error,
            )
        } else {
            ProxyError::network_with_source(
                format!("Upstream request failed: {}", strip_query(url)),
                error,
            )
        }
    }
}

/// 拼接上游根地址与路径，容忍根地址末尾的 `/`
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(head, _)| head)
}
