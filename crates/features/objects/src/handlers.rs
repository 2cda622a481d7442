use crate::repository;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use ingest_domain::constants::{OBJECTS_TAG, TOTAL_COUNT_HEADER};
use ingest_domain::models::{ObjectCreate, ObjectRecord, ObjectUpdate};
use ingest_kernel::prelude::{Admin, ApiError, ApiState, ErrorBody, Page, PageQuery};
use tracing::info;

#[utoipa::path(
    get,
    path = "/object",
    params(PageQuery),
    responses(
        (status = OK, body = Vec<ObjectRecord>,
            headers(("x-total-count" = i64, description = "Objects that are not deleted"))),
        (status = BAD_REQUEST, body = ErrorBody),
    ),
    tag = OBJECTS_TAG,
)]
pub(crate) async fn list_objects(
    State(state): State<ApiState>,
    page: Page,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.database.pool();
    let objects = repository::list(pool, page).await?;
    let total = repository::count(pool).await?;

    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(objects)))
}

#[utoipa::path(
    get,
    path = "/object/{id}",
    params(("id" = i32, Path, description = "Object id")),
    responses(
        (status = OK, body = ObjectRecord),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = OBJECTS_TAG,
)]
pub(crate) async fn get_object(
    State(state): State<ApiState>,
    Path(id): Path<i32>,
) -> Result<Json<ObjectRecord>, ApiError> {
    Ok(Json(repository::find(state.database.pool(), id).await?))
}

#[utoipa::path(
    post,
    path = "/object",
    request_body = ObjectCreate,
    responses(
        (status = CREATED, body = ObjectRecord),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = CONFLICT, description = "Same scheme, host, bucket and key", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = OBJECTS_TAG,
)]
pub(crate) async fn create_object(
    State(state): State<ApiState>,
    Admin(caller): Admin,
    Json(object): Json<ObjectCreate>,
) -> Result<(StatusCode, Json<ObjectRecord>), ApiError> {
    let created = repository::create(state.database.pool(), &object).await?;
    info!(id = created.id, user = ?caller.user, "Object created");

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    patch,
    path = "/object/{id}",
    params(("id" = i32, Path, description = "Object id")),
    request_body = ObjectUpdate,
    responses(
        (status = OK, body = ObjectRecord),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNAUTHORIZED, body = ErrorBody),
        (status = CONFLICT, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = OBJECTS_TAG,
)]
pub(crate) async fn update_object(
    State(state): State<ApiState>,
    _admin: Admin,
    Path(id): Path<i32>,
    Json(update): Json<ObjectUpdate>,
) -> Result<Json<ObjectRecord>, ApiError> {
    Ok(Json(repository::update(state.database.pool(), id, &update).await?))
}

#[utoipa::path(
    delete,
    path = "/object/{id}",
    params(("id" = i32, Path, description = "Object id")),
    responses(
        (status = NO_CONTENT, description = "Object marked deleted"),
        (status = NOT_FOUND, body = ErrorBody),
        (status = UNAUTHORIZED, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = OBJECTS_TAG,
)]
pub(crate) async fn delete_object(
    State(state): State<ApiState>,
    Admin(caller): Admin,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    repository::soft_delete(state.database.pool(), id).await?;
    info!(id, user = ?caller.user, "Object deleted");

    Ok(StatusCode::NO_CONTENT)
}
