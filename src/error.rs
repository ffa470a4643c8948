use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::geo::polyline::DecodeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid credentials".to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("invalid credentials")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("route decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Alert text shown to the agent for failures that surface in the UI.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::PermissionDenied => {
                "Location permission is required to navigate. Enable it and try again.".to_string()
            }
            ClientError::Unauthorized => "Invalid username or password.".to_string(),
            ClientError::NotFound(_) => "Order not found.".to_string(),
            ClientError::Rejected(msg) => format!("Action not allowed: {msg}"),
            ClientError::Network(_) => "Network error. Please try again.".to_string(),
            ClientError::Decode(_) => "Route could not be displayed.".to_string(),
            ClientError::Transport(_) => "Live tracking is unavailable.".to_string(),
            ClientError::Config(msg) => format!("Configuration error: {msg}"),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::{AppError, ClientError};
    use crate::geo::polyline::DecodeError;

    #[test]
    fn app_errors_map_to_status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn decode_errors_convert_into_client_errors() {
        let err: ClientError = DecodeError::Truncated { offset: 4 }.into();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(err.user_message(), "Route could not be displayed.");
    }
}
