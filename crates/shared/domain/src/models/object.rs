use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Storage scheme of an object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "schemeenum", rename_all = "lowercase"))]
pub enum Scheme {
    Http,
    S3,
}

/// A row of `macrostrat.objects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ObjectRecord {
    pub id: i32,
    pub scheme: Scheme,
    pub host: String,
    pub bucket: String,
    pub key: String,
    #[schema(value_type = Option<Object>)]
    pub source: Option<Value>,
    pub mime_type: Option<String>,
    pub sha256_hash: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub deleted_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ObjectCreate {
    pub scheme: Scheme,
    pub host: String,
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub source: Option<Value>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sha256_hash: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ObjectUpdate {
    #[serde(default)]
    pub scheme: Option<Scheme>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub source: Option<Value>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sha256_hash: Option<String>,
}

impl ObjectUpdate {
    /// `true` when the update would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.scheme.is_none()
            && self.host.is_none()
            && self.bucket.is_none()
            && self.key.is_none()
            && self.source.is_none()
            && self.mime_type.is_none()
            && self.sha256_hash.is_none()
    }
}
