//! # API 响应结构
//!
//! 两个函数共用的响应信封：成功时 `{"success": true, "data": ...}`，
//! 失败时 `{"success": false, "error": "..."}`，两者互斥。

use crate::error::{ProxyError, Result};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

/// # 标准错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// # API响应枚举
///
/// 统一所有API出口，方便转换为 `axum::response::Response`
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    Error(StatusCode, String),
    AppError(ProxyError),
}

impl<T: Serialize> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::AppError(error),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success(data) => (
                StatusCode::OK,
                Json(SuccessResponse {
                    success: true,
                    data,
                }),
            )
                .into_response(),
            Self::Error(status, message) => (
                status,
                Json(ErrorResponse {
                    success: false,
                    error: message,
                }),
            )
                .into_response(),
            Self::AppError(error) => {
                let status = error.status_code();
                (
                    status,
                    Json(ErrorResponse {
                        success: false,
                        error: error.client_message(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

/// # 便捷函数：HTTP错误响应
pub fn error(status: StatusCode, message: &str) -> Response {
    ApiResponse::<()>::Error(status, message.to_string()).into_response()
}

/// # 便捷函数：应用错误响应
pub fn app_error(error: ProxyError) -> Response {
    ApiResponse::<()>::AppError(error).into_response()
}
