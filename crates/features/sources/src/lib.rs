//! Sources feature slice.
//!
//! Lists `maps.sources` and exposes each source's polygon staging table
//! (`sources.<primary_table>_polygons`) for filtered reads and bulk edits.

mod error;
pub mod filter;
mod handlers;
mod repository;

pub use crate::error::{SourcesError, SourcesErrorExt};
use crate::filter::Filter;
use ingest_database::{DatabaseError, PgPool, TableSchema, reflect_table};
use ingest_domain::constants::{POLYGON_TABLE_SUFFIX, SOURCES_SCHEMA};
use ingest_domain::models::{CopyColumnRequest, PolygonRow, PolygonUpdate, Source};
use ingest_domain::registry::{FeatureSlice, InitializedSlice};
use ingest_kernel::prelude::{ApiState, Page};
use moka::future::Cache;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const TABLE_CACHE_CAPACITY: u64 = 1024;
const TABLE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
pub struct SourcesInner {
    /// `source_id` -> polygon table name.
    tables: Cache<i32, String>,
}

/// Sources slice state.
#[derive(Debug, Clone)]
pub struct Sources {
    inner: Arc<SourcesInner>,
}

impl Sources {
    #[must_use]
    pub fn new() -> Self {
        let tables =
            Cache::builder().max_capacity(TABLE_CACHE_CAPACITY).time_to_live(TABLE_CACHE_TTL).build();
        Self { inner: Arc::new(SourcesInner { tables }) }
    }

    /// Resolves and reflects the polygon table of `source_id`.
    ///
    /// The table name is cached; columns are reflected on every call.
    ///
    /// # Errors
    /// [`SourcesError::NoSuchTable`] when the source or its table does not exist.
    #[instrument(skip(self, pool))]
    pub async fn polygon_table(
        &self,
        pool: &PgPool,
        source_id: i32,
    ) -> Result<TableSchema, SourcesError> {
        let name = self
            .tables
            .try_get_with(source_id, async {
                debug!(source_id, "Resolving polygon table");
                repository::primary_table(pool, source_id)
                    .await?
                    .map(|primary| format!("{primary}{POLYGON_TABLE_SUFFIX}"))
                    .ok_or(SourcesError::NoSuchTable { source_id })
            })
            .await
            .map_err(|e: Arc<SourcesError>| {
                Arc::try_unwrap(e).unwrap_or_else(|arc| match *arc {
                    SourcesError::NoSuchTable { source_id } => SourcesError::NoSuchTable { source_id },
                    ref other => SourcesError::Internal {
                        message: other.to_string().into(),
                        context: Some("Table cache loader error was shared".into()),
                    },
                })
            })?;

        match reflect_table(pool, SOURCES_SCHEMA, &name).await {
            Err(DatabaseError::NoSuchTable { .. }) => {
                self.tables.invalidate(&source_id).await;
                Err(SourcesError::NoSuchTable { source_id })
            }
            other => other.context("Reflecting polygon table"),
        }
    }

    pub async fn list_sources(
        &self,
        pool: &PgPool,
        page: Page,
        include_geom: bool,
    ) -> Result<Vec<Source>, SourcesError> {
        repository::list_sources(pool, page, include_geom).await
    }

    pub async fn get_source(
        &self,
        pool: &PgPool,
        source_id: i32,
        include_geom: bool,
    ) -> Result<Source, SourcesError> {
        repository::find_source(pool, source_id, include_geom).await
    }

    /// One page of filtered rows plus the unfiltered row count of the table.
    pub async fn polygons(
        &self,
        pool: &PgPool,
        source_id: i32,
        filters: &[Filter],
        page: Page,
    ) -> Result<(Vec<PolygonRow>, i64), SourcesError> {
        let table = self.polygon_table(pool, source_id).await?;
        let rows = repository::select_rows(pool, &table, filters, page).await?;
        let total = repository::count_rows(pool, &table).await?;
        Ok((rows, total))
    }

    /// Applies `update` to every matching polygon.
    ///
    /// # Errors
    /// [`SourcesError::EmptyUpdate`] when no field is set, [`SourcesError::NothingPatched`]
    /// when no row matched.
    pub async fn patch_polygons(
        &self,
        pool: &PgPool,
        source_id: i32,
        filters: &[Filter],
        update: &PolygonUpdate,
    ) -> Result<u64, SourcesError> {
        let assignments = match serde_json::to_value(update) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => return Err(SourcesError::EmptyUpdate),
            Err(e) => {
                return Err(SourcesError::Internal {
                    message: e.to_string().into(),
                    context: Some("Serializing polygon update".into()),
                });
            }
        };
        if assignments.is_empty() {
            return Err(SourcesError::EmptyUpdate);
        }

        let table = self.polygon_table(pool, source_id).await?;
        let patched = repository::update_rows(pool, &table, &assignments, filters).await?;
        ensure_patched(patched)
    }

    /// Copies `request.source_column` into `target_column` on every matching polygon.
    pub async fn copy_column(
        &self,
        pool: &PgPool,
        source_id: i32,
        target_column: &str,
        request: &CopyColumnRequest,
        filters: &[Filter],
    ) -> Result<u64, SourcesError> {
        let table = self.polygon_table(pool, source_id).await?;
        let patched =
            repository::copy_column(pool, &table, target_column, &request.source_column, filters)
                .await?;
        ensure_patched(patched)
    }
}

fn ensure_patched(rows: u64) -> Result<u64, SourcesError> {
    if rows == 0 { Err(SourcesError::NothingPatched) } else { Ok(rows) }
}

impl Default for Sources {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Sources {
    type Target = SourcesInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FeatureSlice for Sources {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Initialize the sources feature.
///
/// # Errors
/// Currently infallible; kept fallible like every other slice initializer.
pub fn init() -> Result<InitializedSlice, SourcesError> {
    info!("Sources slice initialized");
    Ok(InitializedSlice::new("sources", Sources::new()))
}

/// Routes of the sources slice.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::list_sources))
        .routes(routes!(handlers::get_source))
        .routes(routes!(handlers::get_polygons, handlers::patch_polygons))
        .routes(routes!(handlers::copy_column))
}
