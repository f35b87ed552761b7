//! Groups API endpoints.

use api_types::{Page, PageQuery, group::GroupView, named::NameWrite};
use axum::{Extension, extract::State, http::StatusCode};
use engine::{Actor, Group, NameDraft, WriteMode};

use crate::{Json, Path, Query, ServerError, pagination, server::ServerState};

const BASE: &str = "/groups/";

fn map_group(group: Group) -> GroupView {
    GroupView {
        id: group.id,
        url: format!("{BASE}{}/", group.id),
        name: group.name,
    }
}

pub async fn list(
    Extension(_actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<GroupView>>, ServerError> {
    let page = state
        .engine
        .list_groups(pagination::request(&query, &state))
        .await?;
    Ok(Json(pagination::envelope(page, BASE, map_group)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<NameWrite>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state
        .engine
        .create_group(&actor, NameDraft { name: payload.name })
        .await?;
    Ok((StatusCode::CREATED, Json(map_group(group))))
}

pub async fn retrieve(
    Extension(_actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state.engine.group(group_id).await?;
    Ok(Json(map_group(group)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
    Json(payload): Json<NameWrite>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state
        .engine
        .update_group(&actor, group_id, NameDraft { name: payload.name }, WriteMode::Full)
        .await?;
    Ok(Json(map_group(group)))
}

pub async fn partial_update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
    Json(payload): Json<NameWrite>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state
        .engine
        .update_group(
            &actor,
            group_id,
            NameDraft { name: payload.name },
            WriteMode::Partial,
        )
        .await?;
    Ok(Json(map_group(group)))
}

pub async fn destroy(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(group_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(&actor, group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
