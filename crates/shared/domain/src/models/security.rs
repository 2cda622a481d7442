use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims carried by access tokens issued by the platform identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    #[serde(default)]
    pub groups: Vec<i32>,
    pub exp: i64,
}

/// Identity of the caller as seen by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupsResponse {
    pub user: Option<String>,
    pub groups: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    pub group_id: i32,
    #[serde(default)]
    pub expires_in_days: Option<i64>,
}

/// A freshly issued API token. The plaintext is never retrievable again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub group_id: i32,
    pub expires_on: DateTime<Utc>,
}
