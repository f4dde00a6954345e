//! JSON error responses: `{ "error": <code>, "message": <text> }`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::AppError;
use crate::news::NewsError;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound(String),
    /// An extractor turned the request away (bad JSON body, bad query).
    BadRequest { status: StatusCode, message: String },
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError::App(e)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        ApiError::BadRequest { status: r.status(), message: r.body_text() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        ApiError::BadRequest { status: r.status(), message: r.body_text() }
    }
}

fn json_error(status: StatusCode, code: &str, msg: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": code, "message": format!("{msg}") }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing or invalid bearer token"),
            ApiError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", what),
            ApiError::BadRequest { status, message } => json_error(status, "bad_request", message),
            ApiError::App(AppError::Validation(fields)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "validation",
                    "message": "one or more fields are invalid",
                    "fields": fields,
                })),
            )
                .into_response(),
            ApiError::App(AppError::News(NewsError::MissingKey)) => {
                json_error(StatusCode::SERVICE_UNAVAILABLE, "not_configured", NewsError::MissingKey)
            }
            ApiError::App(e @ (AppError::News(_) | AppError::Email(_))) => {
                warn!(error = %e, "upstream failure");
                json_error(StatusCode::BAD_GATEWAY, "upstream", e)
            }
            ApiError::App(e) => {
                error!(error = %e, "request failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal server error")
            }
        }
    }
}
