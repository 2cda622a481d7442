//! The single error type returned by HTTP handlers.

use super::state::ApiStateError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ingest_database::DatabaseError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::error;
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: Cow<'static, str> },

    #[error("{message}")]
    Unauthorized { message: Cow<'static, str> },

    #[error("{message}")]
    NotFound { message: Cow<'static, str> },

    #[error("{message}")]
    Conflict { message: Cow<'static, str> },

    /// Never shown to the client; logged with its context instead.
    #[error("Internal server error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

impl ApiError {
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict { message: message.into() }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unique_violation() {
            return Self::conflict("Resource already exists");
        }
        if err.is_invalid_input() || err.is_foreign_key_violation() {
            let message = err.database_message().map_or_else(|| err.to_string(), str::to_owned);
            return Self::bad_request(message);
        }
        match err {
            DatabaseError::Validation { message, .. } => Self::BadRequest { message },
            DatabaseError::NoSuchTable { message, .. } => {
                Self::NotFound { message: format!("Table {message} not found").into() }
            }
            other => Self::Internal { message: other.to_string().into(), context: None },
        }
    }
}

impl From<ApiStateError> for ApiError {
    fn from(err: ApiStateError) -> Self {
        Self::Internal { message: err.to_string().into(), context: Some("Resolving state".into()) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if let Self::Internal { .. } = &self {
            error!(error = %self, "Request failed");
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_database::testing::server_error;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
    }

    #[test]
    fn database_errors_are_translated() {
        let err: ApiError =
            DatabaseError::Validation { message: "bad".into(), context: None }.into();
        assert!(matches!(err, ApiError::BadRequest { .. }));

        let err: ApiError = DatabaseError::Sqlx { source: sqlx::Error::PoolTimedOut, context: None }.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_mistakes_reported_by_the_server_are_bad_requests() {
        let err: ApiError =
            DatabaseError::from(server_error("42846", "cannot cast type date to integer")).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "cannot cast type date to integer");

        let err: ApiError = DatabaseError::from(server_error(
            "22P02",
            "invalid input syntax for type integer: \"abc\"",
        ))
        .into();
        assert_eq!(err.to_string(), "invalid input syntax for type integer: \"abc\"");

        let err: ApiError = DatabaseError::from(server_error("23505", "duplicate key")).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DatabaseError::from(server_error("42P01", "relation does not exist")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_details_are_hidden() {
        let response =
            ApiError::Internal { message: "password=hunter2".into(), context: None }.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
