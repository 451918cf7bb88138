use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::services::ResourceError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code, e.g. `REQUIRED_FIELD_MISSING`,
    /// `IDENTIFIER_CONFLICT`, `CREDENTIALS_MISSING` or `INTERNAL_ERROR`.
    #[schema(example = "REQUIRED_FIELD_MISSING")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "'Size' unset")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Client input rejected by the ingestion pipeline or a service.
    BadRequest {
        code: &'static str,
        message: String,
    },
    CredentialsMissing,
    InvalidCredentials,
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, ErrorBody { code, message })
            }
            AppError::CredentialsMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "CREDENTIALS_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "IDENTIFIER_CONFLICT",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let challenge = matches!(
            self,
            AppError::CredentialsMissing | AppError::InvalidCredentials
        );

        let (status, body) = self.status_and_body();

        if challenge {
            (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"morpheo\"")],
                Json(body),
            )
                .into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { .. } | ResourceError::ReferenceNotFound { .. } => {
                AppError::NotFound(err.to_string())
            }
            ResourceError::IdentifierConflict { .. } => AppError::Conflict(err.to_string()),
            ResourceError::BlobWrite(_) | ResourceError::StorageBackend(_) => {
                AppError::Internal(err.to_string())
            }
            other => AppError::BadRequest {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}
