//! SQL against `maps.sources` and the reflected polygon tables.

use crate::error::{SourcesError, SourcesErrorExt};
use crate::filter::{Filter, ensure_column, push_where};
use ingest_database::{TableSchema, quote_ident};
use ingest_domain::constants::GEOMETRY_COLUMN;
use ingest_domain::models::{PolygonRow, Source};
use ingest_kernel::prelude::Page;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

const SELECT_SOURCES: &str = r"
SELECT source_id, name, primary_table, url, ref_title, authors, ref_year, ref_source,
       isbn_doi, scale::text AS scale, primary_line_table, licence, features, area, priority,
       CASE WHEN $1 THEN ST_AsGeoJSON(rgeom)::json END AS rgeom,
       display_scales::text[] AS display_scales,
       CASE WHEN $1 THEN ST_AsGeoJSON(web_geom)::json END AS web_geom,
       new_priority, status_code
FROM maps.sources";

#[instrument(skip(pool))]
pub(crate) async fn list_sources(
    pool: &PgPool,
    page: Page,
    include_geom: bool,
) -> Result<Vec<Source>, SourcesError> {
    sqlx::query_as::<_, Source>(&format!("{SELECT_SOURCES} ORDER BY source_id LIMIT $2 OFFSET $3"))
        .bind(include_geom)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
        .context("Listing sources")
}

#[instrument(skip(pool))]
pub(crate) async fn find_source(
    pool: &PgPool,
    source_id: i32,
    include_geom: bool,
) -> Result<Source, SourcesError> {
    sqlx::query_as::<_, Source>(&format!("{SELECT_SOURCES} WHERE source_id = $2"))
        .bind(include_geom)
        .bind(source_id)
        .fetch_optional(pool)
        .await
        .context("Loading source")?
        .ok_or(SourcesError::NoSuchSource { source_id })
}

/// `maps.sources.primary_table` of a source, if the source exists and has one.
#[instrument(skip(pool))]
pub(crate) async fn primary_table(pool: &PgPool, source_id: i32) -> Result<Option<String>, SourcesError> {
    let table = sqlx::query_scalar::<_, Option<String>>(
        "SELECT primary_table FROM maps.sources WHERE source_id = $1",
    )
    .bind(source_id)
    .fetch_optional(pool)
    .await
    .context("Resolving primary table")?;

    Ok(table.flatten())
}

/// Number of rows in the whole table, ignoring filters.
#[instrument(skip_all, fields(table = %table.name))]
pub(crate) async fn count_rows(pool: &PgPool, table: &TableSchema) -> Result<i64, SourcesError> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT count(*) FROM {}", table.qualified_name()))
        .fetch_one(pool)
        .await
        .context("Counting polygons")
}

/// One page of filtered rows, without the geometry column, ordered by the first column.
#[instrument(skip_all, fields(table = %table.name, filters = filters.len()))]
pub(crate) async fn select_rows(
    pool: &PgPool,
    table: &TableSchema,
    filters: &[Filter],
    page: Page,
) -> Result<Vec<PolygonRow>, SourcesError> {
    let rows = select_rows_query(table, filters, page)?
        .build_query_scalar::<Json<Map<String, Value>>>()
        .fetch_all(pool)
        .await
        .context("Selecting polygons")?;

    Ok(rows.into_iter().map(|Json(row)| PolygonRow(row)).collect())
}

fn select_rows_query(
    table: &TableSchema,
    filters: &[Filter],
    page: Page,
) -> Result<QueryBuilder<'static, Postgres>, SourcesError> {
    let columns: Vec<String> = table.column_names(&[GEOMETRY_COLUMN]).map(quote_ident).collect();
    let order = columns.first().map(|first| format!(" ORDER BY {first}"));

    let mut builder = QueryBuilder::<Postgres>::new("SELECT row_to_json(t) FROM (SELECT ");
    builder.push(columns.join(", "));
    builder.push(" FROM ");
    builder.push(table.qualified_name());
    push_where(&mut builder, table, filters)?;
    if let Some(order) = &order {
        builder.push(order);
    }
    builder.push(" LIMIT ");
    builder.push_bind(page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
    builder.push(") AS t");
    // The subquery order does not carry over to the outer select.
    if let Some(order) = &order {
        builder.push(order);
    }

    Ok(builder)
}

/// Writes `assignments` to every row matching `filters`; returns the affected row count.
#[instrument(skip_all, fields(table = %table.name, columns = assignments.len()))]
pub(crate) async fn update_rows(
    pool: &PgPool,
    table: &TableSchema,
    assignments: &Map<String, Value>,
    filters: &[Filter],
) -> Result<u64, SourcesError> {
    if assignments.is_empty() {
        return Err(SourcesError::EmptyUpdate);
    }

    let mut targets = Vec::with_capacity(assignments.len());
    for (name, value) in assignments {
        targets.push((ensure_column(table, name)?, bind_text(value)));
    }

    let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
    builder.push(table.qualified_name());
    builder.push(" SET ");
    let mut separated = builder.separated(", ");
    for (column, value) in targets {
        separated.push(format!("{} = ", quote_ident(&column.name)));
        separated.push_bind_unseparated(value);
        separated.push_unseparated(format!("::{}", column.sql_type()));
    }
    push_where(&mut builder, table, filters)?;

    let result = builder.build().execute(pool).await.context("Patching polygons")?;
    Ok(result.rows_affected())
}

/// Sets `target = source::<target type>` on every row matching `filters`.
#[instrument(skip_all, fields(table = %table.name, target_column = %target, source_column = %source))]
pub(crate) async fn copy_column(
    pool: &PgPool,
    table: &TableSchema,
    target: &str,
    source: &str,
    filters: &[Filter],
) -> Result<u64, SourcesError> {
    let target = ensure_column(table, target)?;
    let source = ensure_column(table, source)?;

    let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
    builder.push(table.qualified_name());
    builder.push(format!(
        " SET {} = {}::{}",
        quote_ident(&target.name),
        quote_ident(&source.name),
        target.sql_type()
    ));
    push_where(&mut builder, table, filters)?;

    let result = builder.build().execute(pool).await.context("Copying column")?;
    Ok(result.rows_affected())
}

/// Text form of a JSON scalar, cast server-side to the column type. `null` stays `NULL`.
fn bind_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parse_filters;
    use ingest_database::Column;
    use serde_json::json;

    fn table() -> TableSchema {
        TableSchema {
            schema: "sources".to_owned(),
            name: "demo_polygons".to_owned(),
            columns: ["_pkid", "geom", "lith"]
                .into_iter()
                .map(|name| Column {
                    name: name.to_owned(),
                    udt_schema: "pg_catalog".to_owned(),
                    udt_name: "text".to_owned(),
                })
                .collect(),
        }
    }

    #[test]
    fn page_order_survives_the_json_wrapper() {
        let filters = parse_filters(&[("lith", "eq.sand")]).unwrap();
        let builder = select_rows_query(&table(), &filters, Page { page: 2, page_size: 10 }).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT row_to_json(t) FROM (SELECT \"_pkid\", \"lith\" FROM \"sources\".\"demo_polygons\" \
             WHERE \"lith\" = $1::\"pg_catalog\".\"text\" ORDER BY \"_pkid\" LIMIT $2 OFFSET $3) AS t \
             ORDER BY \"_pkid\""
        );
    }

    #[test]
    fn json_scalars_are_bound_as_text() {
        assert_eq!(bind_text(&json!("granite")), Some("granite".to_owned()));
        assert_eq!(bind_text(&json!(12)), Some("12".to_owned()));
        assert_eq!(bind_text(&json!(true)), Some("true".to_owned()));
        assert_eq!(bind_text(&Value::Null), None);
    }
}
