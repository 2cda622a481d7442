//! Names shared between the HTTP layer and the database layer.

/// `OpenAPI` tags.
pub const SYSTEM_TAG: &str = "system";
pub const SOURCES_TAG: &str = "sources";
pub const OBJECTS_TAG: &str = "objects";
pub const SECURITY_TAG: &str = "security";

/// Schema holding the per-source staging tables.
pub const SOURCES_SCHEMA: &str = "sources";

/// Suffix appended to `maps.sources.primary_table` to get the polygon table.
pub const POLYGON_TABLE_SUFFIX: &str = "_polygons";
/// Geometry column of polygon tables; never returned or filtered on.
pub const GEOMETRY_COLUMN: &str = "geom";

/// Query parameters consumed by pagination, never treated as filters.
pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Response headers.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
