use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::DateTime;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid window: start_after {start} is after end_before {end}")]
    InvalidWindow { start: i64, end: i64 },
    #[error(
        "invalid shift {code}: start_time {} must be before end_time {}",
        format_millis(.start_time),
        format_millis(.end_time)
    )]
    InvalidShift {
        code: String,
        start_time: i64,
        end_time: i64,
    },
    #[error("invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },
    #[error("missing or empty Authorization header")]
    Unauthorized,
    #[error("shift with code {code} already exists")]
    DuplicateCode { code: String },
    #[error("shift with code {code} not found")]
    NotFound { code: String },
    #[error("no facility info for shelter {shelter}")]
    FacilityNotFound { shelter: String },
    #[error("facility service unavailable: {0}")]
    FacilityUnavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FacilityUnavailable(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput {
            field: "body",
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput {
            field: "query",
            message: rejection.body_text(),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidWindow { .. }
            | AppError::InvalidShift { .. }
            | AppError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } | AppError::FacilityNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::DuplicateCode { .. } => StatusCode::CONFLICT,
            AppError::FacilityUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status_code, body).into_response()
    }
}

// epoch millis, with the UTC rendering when it is representable
fn format_millis(millis: &i64) -> String {
    match DateTime::from_timestamp_millis(*millis) {
        Some(at) => format!("{millis} ({})", at.to_rfc3339()),
        None => millis.to_string(),
    }
}
