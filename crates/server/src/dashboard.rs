//! Dashboard API endpoint.

use api_types::dashboard::Dashboard;
use axum::{Extension, extract::State};
use engine::{Actor, BalanceSummary};

use crate::{Json, ServerError, accounts::map_account, server::ServerState};

fn map_summary(summary: BalanceSummary) -> Dashboard {
    // AccountType::ALL order
    let [asset, cash, debt, savings] = summary.buckets;

    Dashboard {
        asset_accounts: asset.accounts.into_iter().map(map_account).collect(),
        total_asset: asset.total,
        cash_accounts: cash.accounts.into_iter().map(map_account).collect(),
        total_cash: cash.total,
        debt_accounts: debt.accounts.into_iter().map(map_account).collect(),
        total_debt: debt.total,
        savings_accounts: savings.accounts.into_iter().map(map_account).collect(),
        total_savings: savings.total,
        mortgage: summary.mortgage.into_iter().map(map_account).collect(),
    }
}

/// Balances of the caller's accounts (every account, for staff).
pub async fn get_dashboard(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<Dashboard>, ServerError> {
    let summary = state.engine.dashboard(&actor).await?;
    Ok(Json(map_summary(summary)))
}
