use ingest_database::DatabaseError;
use ingest_kernel::prelude::ApiError;
use std::borrow::Cow;

/// Objects slice error type.
#[derive(Debug, thiserror::Error)]
pub enum ObjectsError {
    #[error("Object with id ({id}) not found")]
    NotFound { id: i32 },

    #[error("Object already exists")]
    Duplicate,

    #[error("Objects database error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

pub trait ObjectsErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ObjectsError>;
}

impl<T> ObjectsErrorExt<T> for Result<T, sqlx::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ObjectsError> {
        self.map_err(|source| {
            let source = DatabaseError::from(source);
            if source.is_unique_violation() {
                ObjectsError::Duplicate
            } else {
                ObjectsError::Database { source, context: Some(context.into()) }
            }
        })
    }
}

impl From<ObjectsError> for ApiError {
    fn from(err: ObjectsError) -> Self {
        match err {
            ObjectsError::NotFound { .. } => Self::not_found(err.to_string()),
            ObjectsError::Duplicate => Self::conflict(err.to_string()),
            ObjectsError::Database { source, context } => match Self::from(source) {
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
        let err = ApiError::from(ObjectsError::NotFound { id: 9 });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Object with id (9) not found");

        assert_eq!(ApiError::from(ObjectsError::Duplicate).status(), StatusCode::CONFLICT);

        let err: Result<(), sqlx::Error> = Err(sqlx::Error::PoolClosed);
        let err = err.context("listing objects").unwrap_err();
        assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
