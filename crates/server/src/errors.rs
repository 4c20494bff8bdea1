use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// Errors returned by HTTP handlers and the auth middleware.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized { realm: String },
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => ApiError::NotFound,
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::Model(models::errors::ModelError::Validation(msg)) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            // realm is filled in by the middleware, which knows it
            AuthError::Unauthorized => ApiError::Unauthorized { realm: String::new() },
            AuthError::Forbidden => ApiError::Forbidden,
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(format!("auth {}: {}", other.code(), other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            // Missing cards carry no body so existence is not disclosed
            ApiError::NotFound => status.into_response(),
            ApiError::Unauthorized { realm } => {
                let mut resp = status.into_response();
                let challenge = format!("Basic realm=\"{}\"", realm);
                if let Ok(v) = HeaderValue::from_str(&challenge) {
                    resp.headers_mut().insert(header::WWW_AUTHENTICATE, v);
                }
                resp
            }
            ApiError::Forbidden => status.into_response(),
            ApiError::BadRequest(detail) => {
                (status, Json(serde_json::json!({"error": "Bad Request", "detail": detail}))).into_response()
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                (status, Json(serde_json::json!({"error": "Internal Server Error", "detail": null}))).into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("credential setup failed: {0}")]
    Credentials(#[from] AuthError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
