use crate::filter::ParserError;
use ingest_database::DatabaseError;
use ingest_kernel::prelude::ApiError;
use std::borrow::Cow;

/// Sources slice error type.
#[derive(Debug, thiserror::Error)]
pub enum SourcesError {
    #[error("{source}")]
    Filter {
        #[source]
        source: ParserError,
    },

    #[error("Source with id ({source_id}) not found")]
    NoSuchSource { source_id: i32 },

    #[error("Source table with id ({source_id}) not found")]
    NoSuchTable { source_id: i32 },

    #[error("No rows patched, if this is unexpected please report as bug")]
    NothingPatched,

    #[error("Update body does not set any column")]
    EmptyUpdate,

    #[error("Sources database error{}: {source}", format_context(.context))]
    Database {
        #[source]
        source: DatabaseError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Sources error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

pub trait SourcesErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SourcesError>;
}

impl<T> SourcesErrorExt<T> for Result<T, SourcesError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                SourcesError::Database { context: c, .. } | SourcesError::Internal { context: c, .. } => {
                    *c = Some(context.into());
                }
                _ => {}
            }
            e
        })
    }
}

impl<T> SourcesErrorExt<T> for Result<T, DatabaseError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SourcesError> {
        self.map_err(|source| SourcesError::Database { source, context: Some(context.into()) })
    }
}

impl<T> SourcesErrorExt<T> for Result<T, sqlx::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, SourcesError> {
        self.map_err(|source| SourcesError::Database {
            source: DatabaseError::from(source),
            context: Some(context.into()),
        })
    }
}

impl From<ParserError> for SourcesError {
    #[inline]
    fn from(source: ParserError) -> Self {
        Self::Filter { source }
    }
}

impl From<DatabaseError> for SourcesError {
    #[inline]
    fn from(source: DatabaseError) -> Self {
        Self::Database { source, context: None }
    }
}

impl From<SourcesError> for ApiError {
    fn from(err: SourcesError) -> Self {
        match err {
            SourcesError::NoSuchSource { .. } => Self::not_found(err.to_string()),
            SourcesError::Filter { .. }
            | SourcesError::NoSuchTable { .. }
            | SourcesError::NothingPatched
            | SourcesError::EmptyUpdate => Self::bad_request(err.to_string()),
            SourcesError::Database { source, context } => match Self::from(source) {
                Self::Internal { message, context: inner } => {
                    Self::Internal { message, context: context.or(inner) }
                }
                other => other,
            },
            SourcesError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn messages_match_the_public_contract() {
        assert_eq!(
            SourcesError::NoSuchTable { source_id: 7 }.to_string(),
            "Source table with id (7) not found"
        );
        assert_eq!(
            SourcesError::NoSuchSource { source_id: 7 }.to_string(),
            "Source with id (7) not found"
        );
    }

    #[test]
    fn maps_to_http_statuses() {
        let status = |err: SourcesError| ApiError::from(err).status();
        assert_eq!(status(SourcesError::NoSuchSource { source_id: 1 }), StatusCode::NOT_FOUND);
        assert_eq!(status(SourcesError::NoSuchTable { source_id: 1 }), StatusCode::BAD_REQUEST);
        assert_eq!(status(SourcesError::NothingPatched), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(ParserError::Malformed { column: "a".into(), raw: "b".into() }.into()),
            StatusCode::BAD_REQUEST
        );

        let err: Result<(), sqlx::Error> = Err(sqlx::Error::PoolTimedOut);
        let err = err.context("counting rows").unwrap_err();
        assert_eq!(status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
