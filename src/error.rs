//! Error types for the proxy's HTTP surface
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Message returned to callers for failures they cannot act on.
pub const GENERIC_CLIENT_ERROR: &str = "Something went wrong. Please try again later.";

// == Proxy Error Enum ==
/// HTTP-facing error type. Internal detail never reaches the response body;
/// handlers log it and surface the generic message instead.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Malformed or invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Wrong HTTP method on the emissions endpoint
    #[error("Only POST method is allowed")]
    MethodNotAllowed,

    /// Upstream validation or internal failure; the message is logged, not sent
    #[error("{0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ProxyError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ProxyError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, self.to_string())
            }
            ProxyError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_CLIENT_ERROR.to_string())
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers.
pub type Result<T> = std::result::Result<T, ProxyError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_request_maps_to_400_with_detail() {
        let response = ProxyError::InvalidRequest("impressions must be greater than zero".to_string())
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("impressions"));
    }

    #[tokio::test]
    async fn test_method_not_allowed_maps_to_405() {
        let response = ProxyError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail_behind_generic_message() {
        let response = ProxyError::Internal("scope3 rejected measure row: bad".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"].as_str().unwrap(), GENERIC_CLIENT_ERROR);
    }
}
