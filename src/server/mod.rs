//! # 函数服务器
//!
//! Axum HTTP 服务器，对外暴露 `fortnite-api` 与 `roblox-api` 两个函数

mod handlers;
pub mod response;
mod routes;

pub use response::{ApiResponse, ErrorResponse, SuccessResponse};
pub use routes::{ALLOWED_HEADERS, create_router};

use crate::config::{AppConfig, ServerConfig};
use crate::error::{ProxyError, Result};
use crate::fortnite::FortniteService;
use crate::function::EdgeFunction;
use crate::{linfo, lwarn};
use crate::logging::{LogComponent, LogStage};
use crate::roblox::RobloxService;
use crate::upstream::UpstreamClient;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// 函数服务器
pub struct FunctionServer {
    /// 监听地址
    address: String,
    /// 配置
    config: ServerConfig,
    /// 路由器
    router: Router,
}

impl FunctionServer {
    /// 按应用配置组装两个聚合服务与路由
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = UpstreamClient::new(&config.upstream)?;
        let functions: Vec<Arc<dyn EdgeFunction>> = vec![
            Arc::new(FortniteService::new(client.clone(), config.fortnite.clone())),
            Arc::new(RobloxService::new(client, config.roblox.clone())),
        ];

        if config.fortnite.api_key().is_none() {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "fortnite_key_missing",
                "FORTNITE_API_KEY is not configured, stats requests will fail"
            );
        }

        let router = create_router(&config.server, functions);
        Ok(Self {
            address: config.listen_address(),
            config: config.server.clone(),
            router,
        })
    }

    /// 路由器副本，供测试直接驱动
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 启动服务器，`shutdown` 完成后优雅退出
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.address).await.map_err(|e| {
            ProxyError::server_start_with_source(format!("无法绑定监听地址 {}", self.address), e)
        })?;
        let local: SocketAddr = listener.local_addr()?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!(
                "Serving functions on {local}{}",
                self.config.api_prefix.trim_end_matches('/')
            )
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ProxyError::server_start_with_source("函数服务器运行失败", e))?;

        Ok(())
    }
}
