//! SQL against `macrostrat.objects`. Deleted rows are invisible to every query here.

use crate::error::{ObjectsError, ObjectsErrorExt};
use ingest_domain::models::{ObjectCreate, ObjectRecord, ObjectUpdate};
use ingest_kernel::prelude::Page;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

const COLUMNS: &str = "id, scheme, host, bucket, key, source, mime_type, sha256_hash, \
                       created_on, updated_on, deleted_on";

#[instrument(skip(pool))]
pub(crate) async fn list(pool: &PgPool, page: Page) -> Result<Vec<ObjectRecord>, ObjectsError> {
    sqlx::query_as::<_, ObjectRecord>(&format!(
        "SELECT {COLUMNS} FROM macrostrat.objects WHERE deleted_on IS NULL \
         ORDER BY id LIMIT $1 OFFSET $2"
    ))
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .context("Listing objects")
}

#[instrument(skip(pool))]
pub(crate) async fn count(pool: &PgPool) -> Result<i64, ObjectsError> {
    sqlx::query_scalar::<_, i64>("SELECT count(*) FROM macrostrat.objects WHERE deleted_on IS NULL")
        .fetch_one(pool)
        .await
        .context("Counting objects")
}

#[instrument(skip(pool))]
pub(crate) async fn find(pool: &PgPool, id: i32) -> Result<ObjectRecord, ObjectsError> {
    sqlx::query_as::<_, ObjectRecord>(&format!(
        "SELECT {COLUMNS} FROM macrostrat.objects WHERE id = $1 AND deleted_on IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Loading object")?
    .ok_or(ObjectsError::NotFound { id })
}

#[instrument(skip_all, fields(host = %object.host, bucket = %object.bucket, key = %object.key))]
pub(crate) async fn create(pool: &PgPool, object: &ObjectCreate) -> Result<ObjectRecord, ObjectsError> {
    sqlx::query_as::<_, ObjectRecord>(&format!(
        "INSERT INTO macrostrat.objects (scheme, host, bucket, key, source, mime_type, sha256_hash) \
         VALUES ($1, $2, $3, $4, $5::json, $6, $7) RETURNING {COLUMNS}"
    ))
    .bind(object.scheme)
    .bind(&object.host)
    .bind(&object.bucket)
    .bind(&object.key)
    .bind(object.source.as_ref().map(sqlx::types::Json))
    .bind(&object.mime_type)
    .bind(&object.sha256_hash)
    .fetch_one(pool)
    .await
    .context("Creating object")
}

/// Writes the fields present in `update` and refreshes `updated_on`.
#[instrument(skip(pool, update))]
pub(crate) async fn update(
    pool: &PgPool,
    id: i32,
    update: &ObjectUpdate,
) -> Result<ObjectRecord, ObjectsError> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE macrostrat.objects SET updated_on = now()");
    if let Some(scheme) = update.scheme {
        builder.push(", scheme = ").push_bind(scheme);
    }
    if let Some(host) = &update.host {
        builder.push(", host = ").push_bind(host.clone());
    }
    if let Some(bucket) = &update.bucket {
        builder.push(", bucket = ").push_bind(bucket.clone());
    }
    if let Some(key) = &update.key {
        builder.push(", key = ").push_bind(key.clone());
    }
    if let Some(source) = &update.source {
        builder.push(", source = ").push_bind(sqlx::types::Json(source.clone())).push("::json");
    }
    if let Some(mime_type) = &update.mime_type {
        builder.push(", mime_type = ").push_bind(mime_type.clone());
    }
    if let Some(sha256_hash) = &update.sha256_hash {
        builder.push(", sha256_hash = ").push_bind(sha256_hash.clone());
    }
    builder.push(" WHERE id = ").push_bind(id);
    builder.push(format!(" AND deleted_on IS NULL RETURNING {COLUMNS}"));

    builder
        .build_query_as::<ObjectRecord>()
        .fetch_optional(pool)
        .await
        .context("Updating object")?
        .ok_or(ObjectsError::NotFound { id })
}

/// Marks the object deleted.
#[instrument(skip(pool))]
pub(crate) async fn soft_delete(pool: &PgPool, id: i32) -> Result<(), ObjectsError> {
    let result = sqlx::query(
        "UPDATE macrostrat.objects SET deleted_on = now() WHERE id = $1 AND deleted_on IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await
    .context("Deleting object")?;

    if result.rows_affected() == 0 { Err(ObjectsError::NotFound { id }) } else { Ok(()) }
}
