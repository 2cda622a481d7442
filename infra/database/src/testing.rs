//! Test support: server-side error values for exercising error mapping without a
//! running database, and throwaway databases for tests that need a real server.
//!
//! Tests that need a server read its URL from `INGEST_TEST_DATABASE_URL` and are
//! skipped when the variable is unset.

use crate::{Database, DatabaseBuilder, DatabaseErrorExt, quote_ident};
use sqlx::error::{DatabaseError, ErrorKind};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Connection URL of a server on which tests may create and drop databases.
pub const TEST_DATABASE_URL_VAR: &str = "INGEST_TEST_DATABASE_URL";

static NEXT_DATABASE: AtomicU32 = AtomicU32::new(0);

#[derive(Debug)]
struct ServerError {
    code: &'static str,
    message: &'static str,
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl Error for ServerError {}

impl DatabaseError for ServerError {
    fn message(&self) -> &str {
        self.message
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.code))
    }

    fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        match self.code {
            "23505" => ErrorKind::UniqueViolation,
            "23503" => ErrorKind::ForeignKeyViolation,
            "23502" => ErrorKind::NotNullViolation,
            "23514" => ErrorKind::CheckViolation,
            _ => ErrorKind::Other,
        }
    }
}

/// An error as PostgreSQL would report it, with the given SQLSTATE and message.
#[must_use]
pub fn server_error(code: &'static str, message: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(ServerError { code, message }))
}

/// A freshly created, empty database that lives until [`TestDatabase::drop_database`].
#[derive(Debug)]
pub struct TestDatabase {
    admin: PgPool,
    name: String,
    database: Database,
}

impl TestDatabase {
    /// Creates a uniquely named database on the server at [`TEST_DATABASE_URL_VAR`].
    ///
    /// Returns `Ok(None)` when the variable is unset.
    ///
    /// # Errors
    /// Returns an error if the URL is malformed or the server refuses the connection or
    /// the `CREATE DATABASE`.
    pub async fn create() -> Result<Option<Self>, crate::DatabaseError> {
        let Ok(url) = std::env::var(TEST_DATABASE_URL_VAR) else {
            return Ok(None);
        };

        let admin_options =
            PgConnectOptions::from_str(&url).map_err(|e| crate::DatabaseError::Validation {
                message: e.to_string().into(),
                context: Some("Parsing test database URL".into()),
            })?;
        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(admin_options.clone())
            .await
            .context("Connecting to the test server")?;

        let stamp = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_micros());
        let name = format!(
            "ingest_test_{}_{stamp}_{}",
            std::process::id(),
            NEXT_DATABASE.fetch_add(1, Ordering::Relaxed)
        );
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&name)))
            .execute(&admin)
            .await
            .context("Creating test database")?;

        let options = admin_options.database(&name);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(options.clone())
            .await
            .context("Connecting to the test database")?;

        info!(database = %name, "Test database created");
        Ok(Some(Self { admin, name, database: DatabaseBuilder::wrap(pool, &options) }))
    }

    /// Handle over the test database.
    #[must_use]
    pub fn database(&self) -> Database {
        self.database.clone()
    }

    /// Runs one or more `;`-separated statements, e.g. a schema fixture.
    ///
    /// # Errors
    /// Returns the first statement failure.
    pub async fn execute(&self, sql: &str) -> Result<(), crate::DatabaseError> {
        sqlx::raw_sql(sql).execute(self.database.pool()).await.context("Running fixture")?;
        Ok(())
    }

    /// Closes every connection and drops the database.
    ///
    /// # Errors
    /// Returns an error if the `DROP DATABASE` fails.
    pub async fn drop_database(self) -> Result<(), crate::DatabaseError> {
        self.database.close().await;
        sqlx::query(&format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", quote_ident(&self.name)))
            .execute(&self.admin)
            .await
            .context("Dropping test database")?;
        self.admin.close().await;
        Ok(())
    }
}
