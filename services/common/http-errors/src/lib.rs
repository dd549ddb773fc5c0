use axum::{http::{HeaderValue, StatusCode}, response::{IntoResponse, Response}, Json};
use serde::{Deserialize, Serialize};

pub const ERROR_CODE_HEADER: &str = "X-Error-Code";

/// JSON body shared by every failure the API emits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: u16,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { success: false, error: status.as_u16(), message: message.into() }
    }
}

/// Render an envelope with the machine-readable code mirrored into `X-Error-Code`.
pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let mut resp = (status, Json(ErrorEnvelope::new(status, message))).into_response();
    if let Ok(val) = HeaderValue::from_str(code) {
        resp.headers_mut().insert(ERROR_CODE_HEADER, val);
    }
    resp
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: Option<String> },
    NotFound { code: &'static str },
    Unprocessable { code: &'static str, message: Option<String> },
    Internal { message: String },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self { Self::Internal { message: e.to_string() } }
    pub fn bad_request(code: &'static str) -> Self { Self::BadRequest { code, message: None } }
    pub fn not_found(code: &'static str) -> Self { Self::NotFound { code } }
    pub fn unprocessable(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unprocessable { code, message: Some(message.into()) }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            ApiError::BadRequest { code, message } => (code, message.unwrap_or_else(|| "bad request".into())),
            ApiError::NotFound { code } => (code, "resource not found".into()),
            ApiError::Unprocessable { code, message } => (code, message.unwrap_or_else(|| "unprocessable".into())),
            ApiError::Internal { message } => {
                // detail stays in the logs, never in the body
                tracing::error!(error = %message, "internal error while handling request");
                ("internal_error", "internal server error".into())
            }
        };
        error_response(status, code, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
