//! Balance aggregation by account type.

use rust_decimal::Decimal;

use crate::{Account, AccountType, money};

/// Accounts of one type, mortgages excluded, and their summed balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    pub account_type: AccountType,
    pub accounts: Vec<Account>,
    pub total: Decimal,
}

/// Dashboard summary of the accounts a user may see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSummary {
    /// One bucket per [`AccountType`], in [`AccountType::ALL`] order.
    pub buckets: [Bucket; 4],
    /// Every mortgage account, whatever its type.
    pub mortgage: Vec<Account>,
}

impl BalanceSummary {
    /// Groups `accounts` by type and sums each group.
    ///
    /// Mortgage accounts are listed in [`BalanceSummary::mortgage`] only and
    /// never count towards a bucket total.
    pub fn aggregate(accounts: Vec<Account>) -> Self {
        let (mortgage, regular): (Vec<Account>, Vec<Account>) =
            accounts.into_iter().partition(|account| account.mortgage);

        let buckets = AccountType::ALL.map(|account_type| {
            let accounts: Vec<Account> = regular
                .iter()
                .filter(|account| account.account_type == account_type)
                .cloned()
                .collect();
            let total = money::sum(accounts.iter().map(|account| &account.current_balance));
            Bucket {
                account_type,
                accounts,
                total,
            }
        });

        Self { buckets, mortgage }
    }

    pub fn bucket(&self, account_type: AccountType) -> &Bucket {
        &self.buckets[account_type.index()]
    }
}
