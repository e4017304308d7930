// Response envelope shared by the API handlers

use axum::{http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ErrorResponse>;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn ok(data: T) -> ApiResult<T> {
        Ok(Json(Self::success(data)))
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

pub fn not_found(message: impl Into<String>) -> ErrorResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error(message)))
}

pub fn service_unavailable(message: impl Into<String>) -> ErrorResponse {
    (StatusCode::SERVICE_UNAVAILABLE, Json(ApiResponse::error(message)))
}

pub fn internal_error(message: impl Into<String>) -> ErrorResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(message)))
}

pub fn bad_request(message: impl Into<String>) -> ErrorResponse {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}
