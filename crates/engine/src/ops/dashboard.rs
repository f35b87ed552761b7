use crate::{BalanceSummary, ResultEngine, access::Actor};

use super::Engine;

impl Engine {
    /// Aggregates the balances of the accounts `actor` may see.
    pub async fn dashboard(&self, actor: &Actor) -> ResultEngine<BalanceSummary> {
        let accounts = self.visible_accounts(actor).await?;
        let summary = BalanceSummary::aggregate(accounts);

        for bucket in &summary.buckets {
            tracing::debug!(
                bucket = bucket.account_type.key(),
                accounts = bucket.accounts.len(),
                total = %bucket.total,
                "dashboard bucket"
            );
        }
        Ok(summary)
    }
}
