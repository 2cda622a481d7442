use crate::Sources;
use crate::filter::parse_filters;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use ingest_domain::constants::{SOURCES_TAG, TOTAL_COUNT_HEADER};
use ingest_domain::models::{CopyColumnRequest, PolygonRow, PolygonUpdate, Source};
use ingest_kernel::prelude::{Admin, ApiError, ApiState, ErrorBody, Page, PageQuery};
use serde::Deserialize;
use utoipa::IntoParams;

/// Whether GeoJSON geometries are embedded in the response.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeometryQuery {
    #[serde(default)]
    pub include_geom: bool,
}

/// Raw query string pairs; everything except paging is a filter.
type RawParams = Query<Vec<(String, String)>>;

fn next_link(page: Page, include_geom: bool) -> String {
    let next = page.next();
    let geom = if include_geom { "&include_geom=true" } else { "" };
    format!("</sources?page={}&page_size={}{geom}>; rel=\"next\"", next.page, next.page_size)
}

#[utoipa::path(
    get,
    path = "/sources",
    params(PageQuery, GeometryQuery),
    responses(
        (status = OK, description = "One page of map sources", body = Vec<Source>,
            headers(("link" = String, description = "Next page"))),
        (status = BAD_REQUEST, body = ErrorBody),
    ),
    tag = SOURCES_TAG,
)]
pub(crate) async fn list_sources(
    State(state): State<ApiState>,
    page: Page,
    Query(geometry): Query<GeometryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sources = state
        .try_get_slice::<Sources>()?
        .list_sources(state.database.pool(), page, geometry.include_geom)
        .await?;

    Ok(([(header::LINK, next_link(page, geometry.include_geom))], Json(sources)))
}

#[utoipa::path(
    get,
    path = "/sources/{source_id}",
    params(("source_id" = i32, Path, description = "Source id"), GeometryQuery),
    responses(
        (status = OK, body = Source),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = SOURCES_TAG,
)]
pub(crate) async fn get_source(
    State(state): State<ApiState>,
    Path(source_id): Path<i32>,
    Query(geometry): Query<GeometryQuery>,
) -> Result<Json<Source>, ApiError> {
    let source = state
        .try_get_slice::<Sources>()?
        .get_source(state.database.pool(), source_id, geometry.include_geom)
        .await?;

    Ok(Json(source))
}

#[utoipa::path(
    get,
    path = "/sources/{source_id}/polygons",
    description = "Rows of the source's polygon table without geometry. \
                   Any parameter besides paging is a filter such as `omit=is.false` or `t_interval=in.(1,2)`.",
    params(("source_id" = i32, Path, description = "Source id"), PageQuery),
    responses(
        (status = OK, body = Vec<PolygonRow>,
            headers(("x-total-count" = i64, description = "Rows in the whole table"))),
        (status = BAD_REQUEST, body = ErrorBody),
    ),
    tag = SOURCES_TAG,
)]
pub(crate) async fn get_polygons(
    State(state): State<ApiState>,
    Path(source_id): Path<i32>,
    page: Page,
    Query(params): RawParams,
) -> Result<impl IntoResponse, ApiError> {
    let filters = parse_filters(&params).map_err(crate::SourcesError::from)?;
    let (rows, total) = state
        .try_get_slice::<Sources>()?
        .polygons(state.database.pool(), source_id, &filters, page)
        .await?;

    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(rows)))
}

#[utoipa::path(
    patch,
    path = "/sources/{source_id}/polygons",
    description = "Updates every polygon matching the query filters. Requires an admin token.",
    params(("source_id" = i32, Path, description = "Source id")),
    request_body = PolygonUpdate,
    responses(
        (status = NO_CONTENT, description = "Rows updated"),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = UNAUTHORIZED, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = SOURCES_TAG,
)]
pub(crate) async fn patch_polygons(
    State(state): State<ApiState>,
    _admin: Admin,
    Path(source_id): Path<i32>,
    Query(params): RawParams,
    Json(update): Json<PolygonUpdate>,
) -> Result<StatusCode, ApiError> {
    let filters = parse_filters(&params).map_err(crate::SourcesError::from)?;
    state
        .try_get_slice::<Sources>()?
        .patch_polygons(state.database.pool(), source_id, &filters, &update)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/sources/{source_id}/polygons/{target_column}",
    description = "Copies `source_column` into `target_column`, cast to the target type, \
                   on every polygon matching the query filters. Requires an admin token.",
    params(
        ("source_id" = i32, Path, description = "Source id"),
        ("target_column" = String, Path, description = "Column to overwrite"),
    ),
    request_body = CopyColumnRequest,
    responses(
        (status = NO_CONTENT, description = "Rows updated"),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = UNAUTHORIZED, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = SOURCES_TAG,
)]
pub(crate) async fn copy_column(
    State(state): State<ApiState>,
    _admin: Admin,
    Path((source_id, target_column)): Path<(i32, String)>,
    Query(params): RawParams,
    Json(request): Json<CopyColumnRequest>,
) -> Result<StatusCode, ApiError> {
    let filters = parse_filters(&params).map_err(crate::SourcesError::from)?;
    state
        .try_get_slice::<Sources>()?
        .copy_column(state.database.pool(), source_id, &target_column, &request, &filters)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_link_points_at_the_following_page() {
        let link = next_link(Page { page: 0, page_size: 100 }, false);
        assert_eq!(link, "</sources?page=1&page_size=100>; rel=\"next\"");

        let link = next_link(Page { page: 4, page_size: 10 }, true);
        assert_eq!(link, "</sources?page=5&page_size=10&include_geom=true>; rel=\"next\"");
    }
}
