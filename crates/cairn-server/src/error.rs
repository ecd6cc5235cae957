use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cairn_types::ExplorerError;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    // Internal server errors
    Internal(anyhow::Error),

    // Database related errors
    DatabaseError(anyhow::Error),

    // Validation errors
    ValidationError(String),

    // Not found errors
    NotFound(String),

    // Upstream explorer failures
    UpstreamError(String),

    // Temporarily unable to serve (lock contention, unconfigured pair)
    Unavailable(String),

    // Bad request errors
    BadRequest(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(_) => write!(f, "Internal server error"),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            AppError::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal server error: {}", e))
            }
            AppError::DatabaseError(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error occurred: {}", e))
            }
            AppError::ValidationError(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, format!("Validation error: {}", msg))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, format!("Not found: {}", msg)),
            AppError::UpstreamError(msg) => {
                (StatusCode::BAD_GATEWAY, format!("Upstream error: {}", msg))
            }
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, format!("Unavailable: {}", msg))
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("Bad request: {}", msg)),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "message": error_message,
                "code": status.as_u16()
            }
        }));

        (status, body).into_response()
    }
}

impl From<ExplorerError> for AppError {
    fn from(err: ExplorerError) -> Self {
        match err {
            e if e.is_not_found() => AppError::NotFound(e.to_string()),
            e @ ExplorerError::NotConfigured { .. } => AppError::Unavailable(e.to_string()),
            e @ (ExplorerError::ProviderUnavailable(_)
            | ExplorerError::AdapterNotRegistered { .. }) => AppError::UpstreamError(e.to_string()),
            e @ (ExplorerError::LockUnavailable(_) | ExplorerError::CacheUnavailable(_)) => {
                AppError::Unavailable(e.to_string())
            }
            ExplorerError::Database(e) => AppError::DatabaseError(e.into()),
            ExplorerError::Other(e) => AppError::Internal(e),
            other => AppError::Internal(anyhow::anyhow!(other)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        AppError::DatabaseError(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_types::Operation;

    #[test]
    fn explorer_errors_map_to_expected_statuses() {
        let cases = [
            (ExplorerError::NetworkNotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ExplorerError::NotConfigured { network: "x".into(), operation: Operation::Balance },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ExplorerError::ProviderUnavailable("x".into()), StatusCode::BAD_GATEWAY),
            (ExplorerError::LockUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
