use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A reference to another resource as sent by a client: a bare id (`3`,
/// `"3"`) or a resource path or URL (`"/accounts/3/"`).
///
/// Any other JSON value is kept so the server can reject it as malformed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceRef {
    Id(i64),
    Link(String),
    Other(serde_json::Value),
}

/// Distinguishes a missing field (`None`) from an explicit `null`
/// (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Error body returned by every failing request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A page of a collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

pub mod user {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserWrite {
        pub username: Option<String>,
        pub email: Option<String>,
        pub password: Option<String>,
        pub groups: Option<Vec<i64>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i64,
        pub url: String,
        pub username: String,
        pub email: String,
        pub is_staff: bool,
        pub groups: Vec<i64>,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: i64,
        pub url: String,
        pub name: String,
    }
}

/// Name-only resources: groups, categories and vendors.
pub mod named {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct NameWrite {
        pub name: Option<String>,
    }

    /// A category or a vendor.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct NamedView {
        pub id: i64,
        pub url: String,
        pub name: String,
        pub created: DateTime<Utc>,
        pub last_updated: DateTime<Utc>,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AccountType {
        #[serde(rename = "A")]
        Asset,
        #[serde(rename = "C")]
        Cash,
        #[serde(rename = "D")]
        Debt,
        #[serde(rename = "S")]
        Savings,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountWrite {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub account_owner: Option<Option<ResourceRef>>,
        pub current_balance: Option<Decimal>,
        pub account_type: Option<AccountType>,
        pub mortgage: Option<bool>,
        pub latest_transaction_id: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: i64,
        pub url: String,
        pub name: String,
        pub account_owner: Option<i64>,
        pub current_balance: Decimal,
        pub account_type: AccountType,
        pub mortgage: bool,
        pub latest_transaction_id: i64,
        pub created: DateTime<Utc>,
        pub last_updated: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TransactionKind {
        #[serde(rename = "INC")]
        Increase,
        #[serde(rename = "DEC")]
        Decrease,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionWrite {
        #[serde(default, deserialize_with = "double_option")]
        pub vendor: Option<Option<ResourceRef>>,
        pub description: Option<String>,
        pub date: Option<NaiveDate>,
        pub amount: Option<Decimal>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        #[serde(default, deserialize_with = "double_option")]
        pub category: Option<Option<ResourceRef>>,
        pub account: Option<ResourceRef>,
        pub paid_off: Option<bool>,
        pub recurring: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub url: String,
        pub vendor: Option<String>,
        pub description: String,
        pub date: NaiveDate,
        pub amount: Decimal,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub display_amount: String,
        pub category: Option<String>,
        pub account: String,
        pub paid_off: bool,
        pub recurring: bool,
        pub created: DateTime<Utc>,
        pub last_updated: DateTime<Utc>,
    }
}

pub mod dashboard {
    use super::*;
    use crate::account::AccountView;

    /// Balances grouped by account type. Mortgage accounts only appear in
    /// `mortgage`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Dashboard {
        pub asset_accounts: Vec<AccountView>,
        pub total_asset: Decimal,
        pub cash_accounts: Vec<AccountView>,
        pub total_cash: Decimal,
        pub debt_accounts: Vec<AccountView>,
        pub total_debt: Decimal,
        pub savings_accounts: Vec<AccountView>,
        pub total_savings: Decimal,
        pub mortgage: Vec<AccountView>,
    }
}
