//! # 路由配置
//!
//! 每个函数挂在 `{api_prefix}/{name}` 下，接受 `POST` 与 `OPTIONS`。

use super::handlers::{handle_function, health_handler, ping_handler, preflight};
use crate::config::ServerConfig;
use crate::function::EdgeFunction;
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 浏览器客户端允许携带的请求头
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// 创建完整路由
pub fn create_router(config: &ServerConfig, functions: Vec<Arc<dyn EdgeFunction>>) -> Router {
    let prefix = config.api_prefix.trim_end_matches('/');

    let mut app = Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler));

    for function in functions {
        let path = format!("{prefix}/{}", function.name());
        let route = Router::new()
            .route(&path, post(handle_function).options(preflight))
            .with_state(function);
        app = app.merge(route);
    }

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config));

    app.layer(DefaultBodyLimit::max(config.max_request_size))
        .layer(service_builder)
        .layer(middleware::from_fn(cors_headers_middleware))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>();

    match origins {
        Ok(origins) => layer.allow_origin(origins),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            layer.allow_origin(Any)
        }
    }
}

/// 非预检响应也带上允许的请求头
async fn cors_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .entry(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .or_insert(HeaderValue::from_static(ALLOWED_HEADERS));
    response
}
