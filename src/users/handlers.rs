use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbSession,
    error::{ApiError, ApiResult},
    services::email::validate_and_normalize_email,
    state::AppState,
    users::{
        dto::{CreateUserRequest, DeleteResponse, Pagination, UpdateUserRequest, UserResponse},
        repo_types::{NewUser, UserPatch},
        services,
    },
};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(read_users).post(create_user))
        .route(
            "/users/:user_id",
            get(read_user).patch(update_user).delete(soft_delete_user),
        )
}

#[instrument(skip(state, session, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    session: DbSession,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(payload) = payload?;
    let email =
        validate_and_normalize_email(&payload.email, state.config.email_check_deliverability)
            .await?;

    let new_user = NewUser {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email,
        is_superuser: payload.is_superuser,
        password: payload.password,
    };

    let mut tx = session.acquire().await?;
    let user = services::create(&mut tx, new_user).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(session, query))]
pub async fn read_users(
    session: DbSession,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let Query(p) = query?;
    if p.offset < 0 || p.limit < 0 {
        return Err(ApiError::Validation(
            "offset and limit must not be negative".into(),
        ));
    }

    let mut tx = session.acquire().await?;
    let users = services::list(&mut tx, p.offset, p.limit).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(session, path))]
pub async fn read_user(
    session: DbSession,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Path(user_id) = path?;
    let mut tx = session.acquire().await?;
    let user = services::get_existing(&mut tx, user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, session, path, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    session: DbSession,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Path(user_id) = path?;
    let Json(payload) = payload?;

    let email = match payload.email {
        Some(email) => Some(
            validate_and_normalize_email(&email, state.config.email_check_deliverability).await?,
        ),
        None => None,
    };

    let patch = UserPatch {
        first_name: payload.first_name,
        last_name: payload.last_name,
        email,
        is_superuser: payload.is_superuser,
        password: payload.password,
        deleted_at: None,
    };

    let mut tx = session.acquire().await?;
    let user = services::update(&mut tx, user_id, patch).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(session, path))]
pub async fn soft_delete_user(
    session: DbSession,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    let Path(user_id) = path?;
    let mut tx = session.acquire().await?;
    let user = services::soft_delete(&mut tx, user_id).await?;
    info!(user_id = %user.id, request_id = %session.request_id().0, "delete request served");
    Ok(Json(DeleteResponse::default()))
}
