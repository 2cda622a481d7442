use ingest_database::DatabaseError;
use ingest_kernel::prelude::ApiError;
use std::borrow::Cow;

/// Security slice error type.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("Authentication required")]
    Anonymous,

    #[error("User is not in group ({group_id})")]
    NotInGroup { group_id: i32 },

    #[error("Group ({group_id}) not found")]
    NoSuchGroup { group_id: i32 },

    #[error("Token lifetime must be at least one day, got {days}")]
    InvalidLifetime { days: i64 },

    #[error("Security database error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

pub trait SecurityErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SecurityError>;
}

impl<T> SecurityErrorExt<T> for Result<T, sqlx::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SecurityError> {
        self.map_err(|source| SecurityError::Database {
            source: DatabaseError::from(source),
            context: Some(context.into()),
        })
    }
}

impl From<SecurityError> for ApiError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::Anonymous | SecurityError::NotInGroup { .. } => {
                Self::unauthorized(err.to_string())
            }
            SecurityError::NoSuchGroup { .. } => Self::not_found(err.to_string()),
            SecurityError::InvalidLifetime { .. } => Self::bad_request(err.to_string()),
            SecurityError::Database { source, context } => match Self::from(source) {
                Self::Internal { message, context: inner } => {
                    Self::Internal { message, context: context.or(inner) }
                }
                other => other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn maps_to_http_statuses() {
        assert_eq!(ApiError::from(SecurityError::Anonymous).status(), StatusCode::UNAUTHORIZED);

        let err = ApiError::from(SecurityError::NoSuchGroup { group_id: 99 });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Group (99) not found");

        let err = ApiError::from(SecurityError::InvalidLifetime { days: 0 });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
