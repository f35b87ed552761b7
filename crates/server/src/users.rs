//! Users API endpoints.

use api_types::{
    Page, PageQuery,
    user::{UserView, UserWrite},
};
use axum::{Extension, extract::State, http::StatusCode};
use engine::{Actor, User, UserDraft, WriteMode};

use crate::{Json, Path, Query, ServerError, pagination, server::ServerState};

const BASE: &str = "/users/";

fn map_user(user: User) -> UserView {
    UserView {
        id: user.id,
        url: format!("{BASE}{}/", user.id),
        username: user.username,
        email: user.email,
        is_staff: user.is_staff,
        groups: user.groups,
    }
}

fn draft(payload: UserWrite) -> UserDraft {
    UserDraft {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        groups: payload.groups,
    }
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserView>>, ServerError> {
    let page = state
        .engine
        .list_users(&actor, pagination::request(&query, &state))
        .await?;
    Ok(Json(pagination::envelope(page, BASE, map_user)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<UserWrite>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state.engine.create_user(&actor, draft(payload)).await?;
    Ok((StatusCode::CREATED, Json(map_user(user))))
}

pub async fn retrieve(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(&actor, user_id).await?;
    Ok(Json(map_user(user)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UserWrite>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .update_user(&actor, user_id, draft(payload), WriteMode::Full)
        .await?;
    Ok(Json(map_user(user)))
}

pub async fn partial_update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UserWrite>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .update_user(&actor, user_id, draft(payload), WriteMode::Partial)
        .await?;
    Ok(Json(map_user(user)))
}

pub async fn destroy(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_user(&actor, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
