use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// Failure cases of the portal core.
///
/// Authorization *denials* are not errors: the engine returns `Ok(false)`
/// and the HTTP layer turns that into `Forbidden`. Errors here are the
/// things that stop a request from being evaluated at all.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// No session, or a token the SSO secret does not validate.
    #[error("authentication required: {0}")]
    Unauthorized(String),
    #[error("permission denied: {0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Lifecycle violations: confirming a confirmed invite, closing a
    /// closed task, moving an organization under its own subtree.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("database failure")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Wire shape kept compatible with the portal's existing clients, which
/// expect a single `detail` string.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_by_variant() {
        assert_eq!(AppError::unauthorized("no token").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("nope").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::conflict("done already").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(sqlx::Error::RowNotFound).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn database_detail_does_not_leak_the_cause() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.to_string(), "database failure");
    }
}
