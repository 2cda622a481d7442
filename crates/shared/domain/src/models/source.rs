use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A row of `maps.sources`.
///
/// `rgeom` and `web_geom` are GeoJSON and only present when explicitly requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Source {
    pub source_id: i32,
    pub name: Option<String>,
    pub primary_table: Option<String>,
    pub url: Option<String>,
    pub ref_title: Option<String>,
    pub authors: Option<String>,
    pub ref_year: Option<String>,
    pub ref_source: Option<String>,
    pub isbn_doi: Option<String>,
    pub scale: Option<String>,
    pub primary_line_table: Option<String>,
    pub licence: Option<String>,
    pub features: Option<i32>,
    pub area: Option<i32>,
    pub priority: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub rgeom: Option<Value>,
    pub display_scales: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub web_geom: Option<Value>,
    pub new_priority: Option<i32>,
    pub status_code: Option<String>,
}

/// One row of a polygon staging table, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct PolygonRow(pub Map<String, Value>);

/// Partial update applied to every polygon matching the request filters.
///
/// Absent and `null` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PolygonUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descrip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strat_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lith: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit: Option<bool>,
}

/// Body of the copy-column operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CopyColumnRequest {
    pub source_column: String,
}
