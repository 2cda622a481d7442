//! Security feature slice.
//!
//! Authentication itself happens in the kernel extractors; this slice lets callers
//! inspect their own identity and mint long-lived API tokens for scripts.

mod error;
mod handlers;

pub use crate::error::{SecurityError, SecurityErrorExt};
use chrono::{DateTime, Duration, Utc};
use ingest_domain::config::SecurityConfig;
use ingest_domain::models::TokenResponse;
use ingest_domain::registry::{FeatureSlice, InitializedSlice};
use ingest_kernel::prelude::{ApiState, Caller};
use ingest_kernel::safe_nanoid;
use ingest_kernel::security::hash_token;
use sqlx::PgPool;
use tracing::{info, instrument};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Security slice state.
#[derive(Debug, Clone, Default)]
pub struct Security;

impl FeatureSlice for Security {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Lifetime in days for a new token: the configured default when unset, capped by the maximum.
///
/// # Errors
/// [`SecurityError::InvalidLifetime`] for lifetimes below one day.
pub fn token_lifetime(config: &SecurityConfig, requested: Option<i64>) -> Result<i64, SecurityError> {
    let days = requested.unwrap_or(config.token_ttl_days);
    if days < 1 {
        return Err(SecurityError::InvalidLifetime { days });
    }
    Ok(days.min(config.token_max_ttl_days))
}

/// Checks that `caller` may mint tokens for `group_id`.
///
/// # Errors
/// [`SecurityError::Anonymous`] without credentials, [`SecurityError::NotInGroup`] otherwise.
pub fn authorize_issue(caller: &Caller, group_id: i32, admin_group: i32) -> Result<(), SecurityError> {
    if caller.user.is_none() && caller.groups.is_empty() {
        return Err(SecurityError::Anonymous);
    }
    if caller.in_group(group_id) || caller.in_group(admin_group) {
        Ok(())
    } else {
        Err(SecurityError::NotInGroup { group_id })
    }
}

/// Generates a token, stores its digest and returns the plaintext once.
#[instrument(skip(pool))]
pub async fn issue_token(
    pool: &PgPool,
    group_id: i32,
    lifetime_days: i64,
) -> Result<TokenResponse, SecurityError> {
    let token = safe_nanoid!();
    let expires_on: DateTime<Utc> = Utc::now() + Duration::days(lifetime_days);

    sqlx::query(r#"INSERT INTO macrostrat_auth.token (token, "group", expires_on) VALUES ($1, $2, $3)"#)
        .bind(hash_token(&token))
        .bind(group_id)
        .bind(expires_on)
        .execute(pool)
        .await
        .context("Storing API token")
        .map_err(|err| missing_group(err, group_id))?;

    info!(group_id, %expires_on, "API token issued");
    Ok(TokenResponse { token, group_id, expires_on })
}

/// The token table references `macrostrat_auth."group"`, so an unknown group surfaces as a
/// foreign-key violation.
fn missing_group(err: SecurityError, group_id: i32) -> SecurityError {
    match err {
        SecurityError::Database { source, .. } if source.is_foreign_key_violation() => {
            SecurityError::NoSuchGroup { group_id }
        }
        other => other,
    }
}

/// Initialize the security feature.
///
/// # Errors
/// Currently infallible.
pub fn init() -> Result<InitializedSlice, SecurityError> {
    info!("Security slice initialized");
    Ok(InitializedSlice::new("security", Security))
}

/// Routes of the security slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::groups))
        .routes(routes!(handlers::create_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest_database::testing::server_error;

    fn caller(user: Option<&str>, groups: &[i32]) -> Caller {
        Caller { user: user.map(str::to_owned), groups: groups.to_vec() }
    }

    #[test]
    fn unknown_groups_are_reported_by_id() {
        let fk: Result<(), sqlx::Error> =
            Err(server_error("23503", "insert or update on table \"token\" violates foreign key constraint"));
        let err = fk.context("Storing API token").map_err(|e| missing_group(e, 99)).unwrap_err();
        assert!(matches!(err, SecurityError::NoSuchGroup { group_id: 99 }));

        let other: Result<(), sqlx::Error> = Err(sqlx::Error::PoolClosed);
        let err = other.context("Storing API token").map_err(|e| missing_group(e, 99)).unwrap_err();
        assert!(matches!(err, SecurityError::Database { .. }));
    }

    #[test]
    fn lifetime_defaults_and_caps() {
        let config = SecurityConfig::default();
        assert_eq!(token_lifetime(&config, None).unwrap(), config.token_ttl_days);
        assert_eq!(token_lifetime(&config, Some(7)).unwrap(), 7);
        assert_eq!(token_lifetime(&config, Some(10_000)).unwrap(), config.token_max_ttl_days);
        assert!(matches!(token_lifetime(&config, Some(0)), Err(SecurityError::InvalidLifetime { days: 0 })));
    }

    #[test]
    fn issuing_requires_membership_or_admin() {
        assert!(matches!(authorize_issue(&Caller::anonymous(), 4, 1), Err(SecurityError::Anonymous)));
        assert!(authorize_issue(&caller(Some("a"), &[4]), 4, 1).is_ok());
        assert!(authorize_issue(&caller(Some("a"), &[1]), 4, 1).is_ok());
        assert!(authorize_issue(&caller(None, &[4]), 4, 1).is_ok());
        assert!(matches!(
            authorize_issue(&caller(Some("a"), &[2]), 4, 1),
            Err(SecurityError::NotInGroup { group_id: 4 })
        ));
    }
}
