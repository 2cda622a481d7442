use crate::{authorize_issue, issue_token, token_lifetime};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use ingest_domain::constants::SECURITY_TAG;
use ingest_domain::models::{GroupsResponse, TokenRequest, TokenResponse};
use ingest_kernel::prelude::{ApiError, ApiState, Caller, ErrorBody};

#[utoipa::path(
    get,
    path = "/security/groups",
    responses(
        (status = OK, description = "Identity and groups of the caller", body = GroupsResponse),
        (status = UNAUTHORIZED, body = ErrorBody),
    ),
    security((), ("bearer" = [])),
    tag = SECURITY_TAG,
)]
pub(crate) async fn groups(caller: Caller) -> Json<GroupsResponse> {
    Json(GroupsResponse { user: caller.user, groups: caller.groups })
}

#[utoipa::path(
    post,
    path = "/security/token",
    request_body = TokenRequest,
    responses(
        (status = CREATED, description = "The plaintext token is only returned here", body = TokenResponse),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = UNAUTHORIZED, body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = SECURITY_TAG,
)]
pub(crate) async fn create_token(
    State(state): State<ApiState>,
    caller: Caller,
    Json(request): Json<TokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let security = &state.config.security;
    authorize_issue(&caller, request.group_id, security.admin_group)?;
    let days = token_lifetime(security, request.expires_in_days)?;
    let token = issue_token(state.database.pool(), request.group_id, days).await?;

    Ok((StatusCode::CREATED, Json(token)))
}
