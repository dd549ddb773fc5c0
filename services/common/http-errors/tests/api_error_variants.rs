use common_http_errors::{error_response, ApiError, ErrorEnvelope};
use axum::response::IntoResponse;
use axum::http::StatusCode;

#[test]
fn bad_request_variant() {
    let err = ApiError::bad_request("missing_title");
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "missing_title");
}

#[test]
fn not_found_variant() {
    let err = ApiError::not_found("drink_not_found");
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "drink_not_found");
}

#[test]
fn unprocessable_variant() {
    let err = ApiError::unprocessable("duplicate_title", "a drink with that title already exists");
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "duplicate_title");
}

#[test]
fn internal_variant() {
    let err = ApiError::internal("connection reset");
    let resp = err.into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "internal_error");
}

#[test]
fn envelope_carries_status_as_error_field() {
    let envelope = ErrorEnvelope::new(StatusCode::FORBIDDEN, "forbidden");
    assert!(!envelope.success);
    assert_eq!(envelope.error, 403);
}

#[test]
fn header_skipped_for_unrepresentable_code() {
    let resp = error_response(StatusCode::BAD_REQUEST, "bad\ncode", "bad request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get("X-Error-Code").is_none());
}
