//! Accounts API endpoints.

use api_types::{
    Page, PageQuery,
    account::{AccountType, AccountView, AccountWrite},
};
use axum::{Extension, extract::State, http::StatusCode};
use engine::{AccountDraft, Actor, WriteMode};

use crate::{Json, Path, Query, ServerError, pagination, reference, server::ServerState};

const BASE: &str = "/accounts/";

fn to_engine_type(account_type: AccountType) -> engine::AccountType {
    match account_type {
        AccountType::Asset => engine::AccountType::Asset,
        AccountType::Cash => engine::AccountType::Cash,
        AccountType::Debt => engine::AccountType::Debt,
        AccountType::Savings => engine::AccountType::Savings,
    }
}

fn from_engine_type(account_type: engine::AccountType) -> AccountType {
    match account_type {
        engine::AccountType::Asset => AccountType::Asset,
        engine::AccountType::Cash => AccountType::Cash,
        engine::AccountType::Debt => AccountType::Debt,
        engine::AccountType::Savings => AccountType::Savings,
    }
}

pub(crate) fn map_account(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        url: format!("{BASE}{}/", account.id),
        name: account.name,
        account_owner: account.account_owner,
        current_balance: account.current_balance,
        account_type: from_engine_type(account.account_type),
        mortgage: account.mortgage,
        latest_transaction_id: account.latest_transaction_id,
        created: account.created,
        last_updated: account.last_updated,
    }
}

fn draft(payload: AccountWrite) -> AccountDraft {
    AccountDraft {
        name: payload.name,
        account_owner: payload.account_owner.map(|owner| owner.map(reference)),
        current_balance: payload.current_balance,
        account_type: payload.account_type.map(to_engine_type),
        mortgage: payload.mortgage,
        latest_transaction_id: payload.latest_transaction_id,
    }
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<AccountView>>, ServerError> {
    let page = state
        .engine
        .list_accounts(&actor, pagination::request(&query, &state))
        .await?;
    Ok(Json(pagination::envelope(page, BASE, map_account)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountWrite>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let account = state.engine.create_account(&actor, draft(payload)).await?;
    Ok((StatusCode::CREATED, Json(map_account(account))))
}

pub async fn retrieve(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(&actor, account_id).await?;
    Ok(Json(map_account(account)))
}

async fn write(
    actor: Actor,
    state: ServerState,
    account_id: i64,
    payload: AccountWrite,
    mode: WriteMode,
) -> Result<Json<AccountView>, ServerError> {
    let account = state
        .engine
        .update_account(&actor, account_id, draft(payload), mode)
        .await?;
    Ok(Json(map_account(account)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(account_id): Path<i64>,
    Json(payload): Json<AccountWrite>,
) -> Result<Json<AccountView>, ServerError> {
    write(actor, state, account_id, payload, WriteMode::Full).await
}

pub async fn partial_update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(account_id): Path<i64>,
    Json(payload): Json<AccountWrite>,
) -> Result<Json<AccountView>, ServerError> {
    write(actor, state, account_id, payload, WriteMode::Partial).await
}

pub async fn destroy(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(account_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(&actor, account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
