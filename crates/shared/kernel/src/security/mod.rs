//! Caller authentication.
//!
//! Every request may carry `Authorization: Bearer <token>`. JWT-shaped tokens are
//! verified against the configured secret; anything else is treated as an API token
//! whose SHA-256 digest is looked up in `macrostrat_auth.token`.
//!
//! A JWT subject registered in `macrostrat_auth."user"` gets its groups from
//! `macrostrat_auth.group_members`; the `groups` claim only covers unknown subjects.

use crate::server::error::ApiError;
use crate::server::state::ApiState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use ingest_database::{Database, DatabaseErrorExt};
use ingest_domain::config::SecurityConfig;
use ingest_domain::models::AuthClaims;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

const BEARER_PREFIX: &str = "Bearer ";

/// The authenticated (or anonymous) identity behind a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub user: Option<String>,
    pub groups: Vec<i32>,
}

impl Caller {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_group(&self, group: i32) -> bool {
        self.groups.contains(&group)
    }
}

/// A caller that belongs to the configured admin group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin(pub Caller);

struct AuthenticatorInner {
    key: DecodingKey,
    validation: Validation,
    admin_group: i32,
    membership_lookup: bool,
}

/// Verifies bearer tokens. Cheap to clone.
#[derive(Clone)]
pub struct Authenticator {
    inner: Arc<AuthenticatorInner>,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("admin_group", &self.inner.admin_group)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.jwt.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &config.jwt.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.jwt.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            inner: Arc::new(AuthenticatorInner {
                key: DecodingKey::from_secret(config.jwt.secret.as_bytes()),
                validation,
                admin_group: config.admin_group,
                membership_lookup: config.jwt.membership_lookup,
            }),
        }
    }

    #[must_use]
    pub fn admin_group(&self) -> i32 {
        self.inner.admin_group
    }

    #[must_use]
    pub fn is_admin(&self, caller: &Caller) -> bool {
        caller.in_group(self.inner.admin_group)
    }

    /// Verifies a JWT and returns its claims.
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] for bad signatures, expired or malformed tokens.
    pub fn verify_jwt(&self, token: &str) -> Result<AuthClaims, ApiError> {
        decode::<AuthClaims>(token, &self.inner.key, &self.inner.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected access token");
                ApiError::unauthorized("Invalid access token")
            })
    }

    /// Resolves a bearer token to a [`Caller`].
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] when the token is invalid, unknown or expired.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, db: &Database, token: &str) -> Result<Caller, ApiError> {
        if looks_like_jwt(token) {
            let claims = self.verify_jwt(token)?;
            let stored = if self.inner.membership_lookup {
                member_groups(db, &claims.sub).await?
            } else {
                None
            };
            return Ok(Caller { groups: stored.unwrap_or(claims.groups), user: Some(claims.sub) });
        }

        let group = sqlx::query_scalar::<_, i32>(
            r#"UPDATE macrostrat_auth.token SET used_on = now()
               WHERE token = $1 AND expires_on > now()
               RETURNING "group""#,
        )
        .bind(hash_token(token))
        .fetch_optional(db.pool())
        .await
        .context("Looking up API token")?;

        group.map_or_else(
            || Err(ApiError::unauthorized("Invalid or expired API token")),
            |group| Ok(Caller { user: None, groups: vec![group] }),
        )
    }
}

/// Groups of the user with subject `sub`, or `None` when no such user is registered.
#[instrument(skip(db))]
async fn member_groups(db: &Database, sub: &str) -> Result<Option<Vec<i32>>, ApiError> {
    let groups = sqlx::query_scalar::<_, Vec<i32>>(
        r#"SELECT coalesce(
                   array_agg(DISTINCT gm.group_id ORDER BY gm.group_id)
                       FILTER (WHERE gm.group_id IS NOT NULL),
                   '{}')::int4[]
             FROM macrostrat_auth."user" u
             LEFT JOIN macrostrat_auth.group_members gm ON gm.user_id = u.id
            WHERE u.sub = $1
           HAVING count(u.id) > 0"#,
    )
    .bind(sub)
    .fetch_optional(db.pool())
    .await
    .context("Loading group memberships")?;

    Ok(groups)
}

/// Hex-encoded SHA-256 digest under which API tokens are stored.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn looks_like_jwt(token: &str) -> bool {
    token.split('.').count() == 3
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| ApiError::unauthorized("Invalid authorization header"))?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization header"))?;

    Ok(Some(token))
}

impl FromRequestParts<ApiState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => state.auth.authenticate(&state.database, token).await,
            None => Ok(Self::anonymous()),
        }
    }
}

impl FromRequestParts<ApiState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if state.auth.is_admin(&caller) {
            Ok(Self(caller))
        } else {
            Err(ApiError::unauthorized("User is not in admin group"))
        }
    }
}
