//! User API handlers
//!
//! Creation and public lookups are anonymous; the private projection sits
//! behind `auth_middleware`. Everything delegates to `AccountService`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::debug;

use super::dto::{CreateUserRequest, PrivateUserDto, PublicUserDto};
use crate::application::SharedAccountService;
use crate::auth::Caller;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};

#[derive(Clone)]
pub struct UserHandlerState {
    pub accounts: SharedAccountService,
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<PublicUserDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or username already taken")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUserDto>>), ApiError> {
    let account = state.accounts.create(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PublicUserDto::from(account))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{identifier}",
    tag = "Users",
    params(("identifier" = String, Path, description = "Object id, email or username")),
    responses(
        (status = 200, description = "Public user", body = ApiResponse<PublicUserDto>),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_public_user(
    State(state): State<UserHandlerState>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<PublicUserDto>>, ApiError> {
    let account = state.accounts.find_by_identifier(&identifier).await?;
    Ok(Json(ApiResponse::success(PublicUserDto::from(account))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{identifier}/private",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("identifier" = String, Path, description = "Object id, email or username")),
    responses(
        (status = 200, description = "Private user", body = ApiResponse<PrivateUserDto>),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_private_user(
    State(state): State<UserHandlerState>,
    Extension(caller): Extension<Caller>,
    Path(identifier): Path<String>,
) -> Result<Json<ApiResponse<PrivateUserDto>>, ApiError> {
    debug!(caller = %caller.subject, "Private user lookup");
    let account = state.accounts.find_by_identifier(&identifier).await?;
    Ok(Json(ApiResponse::success(PrivateUserDto::from(account))))
}
