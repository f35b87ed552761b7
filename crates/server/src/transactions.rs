//! Transactions API endpoints.

use api_types::{
    Page, PageQuery,
    transaction::{TransactionKind, TransactionView, TransactionWrite},
};
use axum::{Extension, extract::State, http::StatusCode};
use engine::{Actor, TransactionDraft, WriteMode};

use crate::{Json, Path, Query, ServerError, pagination, reference, server::ServerState};

const BASE: &str = "/transactions/";

fn to_engine_kind(kind: TransactionKind) -> engine::TransactionKind {
    match kind {
        TransactionKind::Increase => engine::TransactionKind::Increase,
        TransactionKind::Decrease => engine::TransactionKind::Decrease,
    }
}

fn from_engine_kind(kind: engine::TransactionKind) -> TransactionKind {
    match kind {
        engine::TransactionKind::Increase => TransactionKind::Increase,
        engine::TransactionKind::Decrease => TransactionKind::Decrease,
    }
}

fn map_transaction(transaction: engine::Transaction) -> TransactionView {
    let display_amount = transaction.display_amount();
    TransactionView {
        id: transaction.id,
        url: format!("{BASE}{}/", transaction.id),
        vendor: transaction.vendor.map(|id| format!("/vendors/{id}/")),
        description: transaction.description,
        date: transaction.date,
        amount: transaction.amount,
        kind: from_engine_kind(transaction.kind),
        display_amount,
        category: transaction.category.map(|id| format!("/category/{id}/")),
        account: format!("/accounts/{}/", transaction.account),
        paid_off: transaction.paid_off,
        recurring: transaction.recurring,
        created: transaction.created,
        last_updated: transaction.last_updated,
    }
}

fn draft(payload: TransactionWrite) -> TransactionDraft {
    TransactionDraft {
        vendor: payload.vendor.map(|vendor| vendor.map(reference)),
        description: payload.description,
        date: payload.date,
        amount: payload.amount,
        kind: payload.kind.map(to_engine_kind),
        category: payload.category.map(|category| category.map(reference)),
        account: payload.account.map(reference),
        paid_off: payload.paid_off,
        recurring: payload.recurring,
    }
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<TransactionView>>, ServerError> {
    let page = state
        .engine
        .list_transactions(&actor, pagination::request(&query, &state))
        .await?;
    Ok(Json(pagination::envelope(page, BASE, map_transaction)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionWrite>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let transaction = state
        .engine
        .create_transaction(&actor, draft(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_transaction(transaction))))
}

pub async fn retrieve(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state.engine.transaction(&actor, transaction_id).await?;
    Ok(Json(map_transaction(transaction)))
}

async fn write(
    actor: Actor,
    state: ServerState,
    transaction_id: i64,
    payload: TransactionWrite,
    mode: WriteMode,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state
        .engine
        .update_transaction(&actor, transaction_id, draft(payload), mode)
        .await?;
    Ok(Json(map_transaction(transaction)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<TransactionWrite>,
) -> Result<Json<TransactionView>, ServerError> {
    write(actor, state, transaction_id, payload, WriteMode::Full).await
}

pub async fn partial_update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<TransactionWrite>,
) -> Result<Json<TransactionView>, ServerError> {
    write(actor, state, transaction_id, payload, WriteMode::Partial).await
}

pub async fn destroy(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(transaction_id): Path<i64>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(&actor, transaction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
