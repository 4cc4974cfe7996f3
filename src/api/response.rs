//! Error envelope and request extraction

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Error;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Error message
    pub error: String,
}

/// JSON body extractor whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct Payload<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Upstream { .. } => StatusCode::BAD_REQUEST,
            Error::NotInstalled(_) => StatusCode::NOT_FOUND,
            Error::AlreadyInstalled(_) | Error::AlreadyRunning(_) | Error::NotRunning(_) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if self.is_client_facing() {
            tracing::warn!(status = status.as_u16(), "request failed: {}", self);
            self.to_string()
        } else {
            tracing::error!("internal error: {}", self);
            "Internal server error".to_string()
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vendor;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::NotInstalled("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::AlreadyInstalled("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(Error::NotRunning("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Upstream {
                vendor: Vendor::Mem0,
                status: Some(503),
                message: "HTTP 503".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::Other("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_errors_are_masked() {
        let response = Error::Config("secret path /etc/x".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Internal server error");
    }
}
