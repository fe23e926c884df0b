//! # 请求处理器
//!
//! 每个函数只有一个处理器：解析请求体 → 调用函数 → 按结果生成响应信封。

use super::response::{self, ApiResponse};
use crate::error::{ErrorCategory, ProxyError};
use crate::function::EdgeFunction;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror, linfo, lwarn};
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// 函数调用入口
pub async fn handle_function(
    State(function): State<Arc<dyn EdgeFunction>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            lwarn!(
                request_id,
                LogStage::RequestStart,
                LogComponent::Handler,
                "read_body_failed",
                &format!("Error in {}: {rejection}", function.name())
            );
            return response::error(rejection.status(), &rejection.body_text());
        }
    };

    let payload = match parse_body(&body) {
        Ok(payload) => payload,
        Err(error) => {
            lwarn!(
                request_id,
                LogStage::RequestStart,
                LogComponent::Handler,
                "parse_body_failed",
                &format!("Error in {}: {error}", function.name())
            );
            return response::app_error(error);
        }
    };

    let request_type = payload.get("type").and_then(Value::as_str).unwrap_or("-");
    linfo!(
        request_id,
        LogStage::RequestStart,
        LogComponent::Handler,
        "invoke",
        &format!("invoking {}", function.name()),
        request_type = request_type
    );

    let result = function.invoke(&request_id, payload).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match &result {
        Ok(_) => ldebug!(
            request_id,
            LogStage::Response,
            LogComponent::Handler,
            "invoke_ok",
            &format!("{} completed", function.name()),
            elapsed_ms = elapsed_ms
        ),
        Err(error) => log_failure(&request_id, function.name(), error, elapsed_ms),
    }

    ApiResponse::from(result).into_response()
}

/// 请求体必须是 JSON 对象；空请求体按 `{}` 处理
fn parse_body(bytes: &[u8]) -> Result<Value, ProxyError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ProxyError::invalid_request(
            "Invalid request body: expected a JSON object",
        )),
        Err(e) => Err(ProxyError::invalid_request(format!(
            "Invalid request body: {e}"
        ))),
    }
}

fn log_failure(request_id: &str, name: &str, error: &ProxyError, elapsed_ms: u64) {
    let message = format!("Error in {name}: {error}");
    match error.category() {
        ErrorCategory::Client => lwarn!(
            request_id,
            LogStage::ResponseFailure,
            LogComponent::Handler,
            "invoke_failed",
            &message,
            status = error.status_code().as_u16(),
            elapsed_ms = elapsed_ms
        ),
        ErrorCategory::Server => lerror!(
            request_id,
            LogStage::ResponseFailure,
            LogComponent::Handler,
            "invoke_failed",
            &message,
            status = error.status_code().as_u16(),
            elapsed_ms = elapsed_ms
        ),
    }
}

/// 预检请求：空响应体，CORS 头由中间件补齐
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// 存活探测
pub async fn ping_handler() -> &'static str {
    "pong"
}

/// 健康检查
pub async fn health_handler() -> Response {
    response::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"")]
    #[case(b"  \n")]
    fn empty_body_is_empty_object(#[case] body: &[u8]) {
        assert_eq!(parse_body(body).unwrap(), json!({}));
    }

    #[rstest]
    #[case(b"not json")]
    #[case(b"[1, 2]")]
    #[case(b"\"stats\"")]
    #[case(b"null")]
    fn non_object_body_is_rejected(#[case] body: &[u8]) {
        let error = parse_body(body).unwrap_err();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn object_body_is_passed_through() {
        let value = parse_body(br#"{"type":"popular"}"#).unwrap();
        assert_eq!(value["type"], "popular");
    }
}
