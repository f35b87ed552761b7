//! Transaction primitives.
//!
//! A `Transaction` records money moving in or out of exactly one `Account`,
//! optionally attributed to a vendor and a category.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine,
    access::{Owned, Ownership},
    money,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "INC")]
    Increase,
    #[serde(rename = "DEC")]
    Decrease,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increase => "INC",
            Self::Decrease => "DEC",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INC" => Ok(Self::Increase),
            "DEC" => Ok(Self::Decrease),
            other => Err(EngineError::Validation(format!(
                "type: \"{other}\" is not a valid choice"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub vendor: Option<i64>,
    pub description: String,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: Option<i64>,
    pub account: i64,
    /// Owner of the parent account, resolved when the transaction is loaded.
    pub account_owner: Option<i64>,
    pub paid_off: bool,
    pub recurring: bool,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Transaction {
    /// Signed dollar rendering, e.g. `+$12.00` or `-$3.50`.
    pub fn display_amount(&self) -> String {
        let sign = match self.kind {
            TransactionKind::Increase => "+",
            TransactionKind::Decrease => "-",
        };
        format!("{sign}${}", self.amount)
    }
}

impl Owned for Transaction {
    fn ownership(&self) -> Ownership {
        Ownership::ViaAccount(self.account_owner)
    }
}

impl TryFrom<(Model, Option<i64>)> for Transaction {
    type Error = EngineError;

    fn try_from((model, account_owner): (Model, Option<i64>)) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            vendor: model.vendor_id,
            description: model.description,
            date: model.date,
            amount: money::from_minor(model.amount_minor),
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category: model.category_id,
            account: model.account_id,
            account_owner,
            paid_off: model.paid_off,
            recurring: model.recurring,
            created: model.created,
            last_updated: model.last_updated,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub vendor_id: Option<i64>,
    pub description: String,
    pub date: Date,
    pub amount_minor: i64,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub category_id: Option<i64>,
    pub account_id: i64,
    pub paid_off: bool,
    pub recurring: bool,
    pub created: DateTimeUtc,
    pub last_updated: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::vendors::Entity",
        from = "Column::VendorId",
        to = "super::vendors::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Vendor,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::vendors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
