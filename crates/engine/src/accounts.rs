//! The module contains `Account` and its account type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine,
    access::{Owned, Ownership},
    money,
};

/// The closed set of account types.
///
/// Each type stores as a one-letter code and aggregates under its own
/// dashboard bucket key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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

impl AccountType {
    pub const ALL: [AccountType; 4] = [Self::Asset, Self::Cash, Self::Debt, Self::Savings];

    /// Position in [`AccountType::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Asset => 0,
            Self::Cash => 1,
            Self::Debt => 2,
            Self::Savings => 3,
        }
    }

    /// Code persisted in the database and exchanged over the API.
    pub fn code(self) -> &'static str {
        match self {
            Self::Asset => "A",
            Self::Cash => "C",
            Self::Debt => "D",
            Self::Savings => "S",
        }
    }

    /// Key of the dashboard bucket (`<key>_accounts`, `total_<key>`).
    pub fn key(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Cash => "cash",
            Self::Debt => "debt",
            Self::Savings => "savings",
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "A" => Ok(Self::Asset),
            "C" => Ok(Self::Cash),
            "D" => Ok(Self::Debt),
            "S" => Ok(Self::Savings),
            other => Err(EngineError::Validation(format!(
                "account_type: \"{other}\" is not a valid choice"
            ))),
        }
    }
}

/// A financial account owned by a user.
///
/// `current_balance` is the authoritative balance; recording transactions
/// does not change it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_owner: Option<i64>,
    pub current_balance: Decimal,
    pub account_type: AccountType,
    pub mortgage: bool,
    pub latest_transaction_id: i64,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Owned for Account {
    fn ownership(&self) -> Ownership {
        Ownership::Direct(self.account_owner)
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            name: model.name,
            account_owner: model.account_owner,
            current_balance: money::from_minor(model.current_balance_minor),
            account_type: AccountType::try_from(model.account_type.as_str())?,
            mortgage: model.mortgage,
            latest_transaction_id: model.latest_transaction_id,
            created: model.created,
            last_updated: model.last_updated,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub account_owner: Option<i64>,
    pub current_balance_minor: i64,
    pub account_type: String,
    pub mortgage: bool,
    pub latest_transaction_id: i64,
    pub created: DateTimeUtc,
    pub last_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AccountOwner",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Owner,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
