use std::borrow::Cow;

/// A specialized [`DatabaseError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Validation errors.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Occurs when connectivity or health checks fail.
    #[error("Database connection failed{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A reflected table does not exist or has no visible columns.
    #[error("Table not found{}: {message}", format_context(.context))]
    NoSuchTable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A wrapper for underlying `sqlx` errors.
    #[error("SQL error{}: {source}", format_context(.context))]
    Sqlx {
        #[source]
        source: sqlx::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal database error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl DatabaseError {
    /// `true` when the underlying driver reported a unique-constraint violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx { source: sqlx::Error::Database(db), .. } => db.is_unique_violation(),
            _ => false,
        }
    }

    /// `true` when the underlying driver reported a foreign-key violation (SQLSTATE 23503).
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        self.sqlstate().is_some_and(|code| code == FOREIGN_KEY_VIOLATION)
    }

    /// `true` for values or expressions the caller got wrong: SQLSTATE class 22 (data
    /// exception) plus the class 42 cast failures (`cannot coerce`, `datatype mismatch`).
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        self.sqlstate()
            .is_some_and(|code| code.starts_with("22") || INVALID_CASTS.contains(&code.as_ref()))
    }

    /// The SQLSTATE reported by the server, if the error came from it.
    #[must_use]
    pub fn sqlstate(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Sqlx { source: sqlx::Error::Database(db), .. } => db.code(),
            _ => None,
        }
    }

    /// The server's own message, without the driver and context prefixes.
    #[must_use]
    pub fn database_message(&self) -> Option<&str> {
        match self {
            Self::Sqlx { source: sqlx::Error::Database(db), .. } => Some(db.message()),
            _ => None,
        }
    }
}

const FOREIGN_KEY_VIOLATION: &str = "23503";
const INVALID_CASTS: [&str; 2] = ["42846", "42804"];

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// Attaches a human readable context to database results.
pub trait DatabaseErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DatabaseError>;
}

impl<T> DatabaseErrorExt<T> for Result<T, DatabaseError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                DatabaseError::Validation { context: c, .. }
                | DatabaseError::Connection { context: c, .. }
                | DatabaseError::NoSuchTable { context: c, .. }
                | DatabaseError::Sqlx { context: c, .. }
                | DatabaseError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> DatabaseErrorExt<T> for Result<T, sqlx::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DatabaseError> {
        self.map_err(|source| DatabaseError::Sqlx { source, context: Some(context.into()) })
    }
}

impl From<sqlx::Error> for DatabaseError {
    #[inline]
    fn from(source: sqlx::Error) -> Self {
        Self::Sqlx { source, context: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::server_error;

    #[test]
    fn context_is_rendered_in_message() {
        let err: Result<(), DatabaseError> =
            Err(DatabaseError::Validation { message: "URL is required".into(), context: None });
        let err = err.context("building pool").unwrap_err();
        assert_eq!(err.to_string(), "Validation error (building pool): URL is required");
    }

    #[test]
    fn sqlx_errors_are_wrapped() {
        let err: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = err.context("loading source").unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlx { .. }));
        assert!(err.to_string().starts_with("SQL error (loading source)"));
        assert!(!err.is_unique_violation());
        assert!(!err.is_invalid_input());
        assert!(!err.is_foreign_key_violation());
        assert_eq!(err.database_message(), None);
    }

    #[test]
    fn server_errors_are_classified_by_sqlstate() {
        let err = DatabaseError::from(server_error("22P02", "invalid input syntax for type integer: \"x\""));
        assert!(err.is_invalid_input());
        assert_eq!(err.database_message(), Some("invalid input syntax for type integer: \"x\""));

        let err = DatabaseError::from(server_error("42846", "cannot cast type date to integer"));
        assert!(err.is_invalid_input());
        assert!(DatabaseError::from(server_error("42804", "datatype mismatch")).is_invalid_input());

        let err = DatabaseError::from(server_error("23503", "violates foreign key constraint"));
        assert!(err.is_foreign_key_violation());
        assert!(!err.is_invalid_input());

        let err = DatabaseError::from(server_error("42P01", "relation does not exist"));
        assert!(!err.is_invalid_input());
        assert_eq!(err.sqlstate().as_deref(), Some("42P01"));
    }
}
