use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind,
    access::{Actor, Claims, Reference},
    accounts, categories, money, transactions, vendors,
};

use super::{Engine, Page, PageRequest, WriteMode, required, resolve_reference, with_tx};

const DESCRIPTION_MAX_LEN: usize = 255;

/// Transaction fields carried by a create or update request.
///
/// `vendor` and `category` distinguish "not sent" (`None`) from an explicit
/// null (`Some(None)`), which clears the reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionDraft {
    pub vendor: Option<Option<Reference>>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionKind>,
    pub category: Option<Option<Reference>>,
    pub account: Option<Reference>,
    pub paid_off: Option<bool>,
    pub recurring: Option<bool>,
}

impl TransactionDraft {
    fn claims(&self) -> Claims {
        Claims {
            account_owner: None,
            account: self.account.clone(),
        }
    }
}

fn normalize_description(value: String) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(EngineError::Validation(format!(
            "description: ensure this field has no more than {DESCRIPTION_MAX_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

async fn resolve_account(
    db: &impl ConnectionTrait,
    reference: &Reference,
) -> ResultEngine<accounts::Model> {
    let id = resolve_reference::<accounts::Entity>(db, reference, "account").await?;
    accounts::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("account {id}")))
}

async fn resolve_optional<E>(
    db: &impl ConnectionTrait,
    reference: Option<&Reference>,
    field: &str,
) -> ResultEngine<Option<i64>>
where
    E: EntityTrait,
    i64: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    match reference {
        Some(reference) => Ok(Some(resolve_reference::<E>(db, reference, field).await?)),
        None => Ok(None),
    }
}

async fn load_with_owner(
    db: &impl ConnectionTrait,
    transaction_id: i64,
) -> ResultEngine<(transactions::Model, Option<i64>)> {
    let (model, account) = transactions::Entity::find_by_id(transaction_id)
        .find_also_related(accounts::Entity)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("transaction {transaction_id}")))?;
    Ok((model, account.and_then(|account| account.account_owner)))
}

impl Engine {
    /// Lists the transactions of the accounts `actor` owns, or all for staff.
    pub async fn list_transactions(
        &self,
        actor: &Actor,
        request: PageRequest,
    ) -> ResultEngine<Page<Transaction>> {
        let mut query = transactions::Entity::find().order_by_asc(transactions::Column::Id);
        if !actor.is_admin() {
            query = query
                .inner_join(accounts::Entity)
                .filter(accounts::Column::AccountOwner.eq(actor.id));
        }
        let page = self.fetch_page(query, request).await?;

        let account_ids: Vec<i64> = page.items.iter().map(|tx| tx.account_id).collect();
        let owners: HashMap<i64, Option<i64>> = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(account_ids))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|account| (account.id, account.account_owner))
            .collect();

        page.try_map(|model| {
            let owner = owners.get(&model.account_id).copied().flatten();
            Transaction::try_from((model, owner))
        })
    }

    pub async fn transaction(&self, actor: &Actor, transaction_id: i64) -> ResultEngine<Transaction> {
        let transaction = Transaction::try_from(load_with_owner(&self.database, transaction_id).await?)?;
        self.require_access(actor, &transaction)?;
        Ok(transaction)
    }

    /// Records a transaction against an account the actor owns.
    ///
    /// The account's `latest_transaction_id` is stamped with the new id; its
    /// balance is left untouched.
    pub async fn create_transaction(
        &self,
        actor: &Actor,
        draft: TransactionDraft,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.authorize_claims(&db_tx, actor, &draft.claims()).await?;

            let account_ref = draft
                .account
                .as_ref()
                .ok_or_else(|| EngineError::required("account"))?;
            let account = resolve_account(&db_tx, account_ref).await?;
            let date = draft.date.ok_or_else(|| EngineError::required("date"))?;
            let kind = draft.kind.ok_or_else(|| EngineError::required("type"))?;
            let description = normalize_description(draft.description.unwrap_or_default())?;
            let amount_minor = money::to_minor(draft.amount.unwrap_or(Decimal::ZERO))?;
            let vendor_id =
                resolve_optional::<vendors::Entity>(&db_tx, draft.vendor.flatten().as_ref(), "vendor")
                    .await?;
            let category_id = resolve_optional::<categories::Entity>(
                &db_tx,
                draft.category.flatten().as_ref(),
                "category",
            )
            .await?;

            let now = Utc::now();
            let model = transactions::ActiveModel {
                id: ActiveValue::NotSet,
                vendor_id: ActiveValue::Set(vendor_id),
                description: ActiveValue::Set(description),
                date: ActiveValue::Set(date),
                amount_minor: ActiveValue::Set(amount_minor),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                category_id: ActiveValue::Set(category_id),
                account_id: ActiveValue::Set(account.id),
                paid_off: ActiveValue::Set(draft.paid_off.unwrap_or(false)),
                recurring: ActiveValue::Set(draft.recurring.unwrap_or(false)),
                created: ActiveValue::Set(now),
                last_updated: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            accounts::ActiveModel {
                id: ActiveValue::Set(account.id),
                latest_transaction_id: ActiveValue::Set(model.id),
                last_updated: ActiveValue::Set(now),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            tracing::info!(transaction = model.id, account = account.id, "transaction created");
            Transaction::try_from((model, account.account_owner))
        })
    }

    /// Updates a transaction; moving it to another account requires owning
    /// that account too.
    pub async fn update_transaction(
        &self,
        actor: &Actor,
        transaction_id: i64,
        draft: TransactionDraft,
        mode: WriteMode,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            self.authorize_claims(&db_tx, actor, &draft.claims()).await?;

            let (model, owner) = load_with_owner(&db_tx, transaction_id).await?;
            self.require_access(actor, &Transaction::try_from((model.clone(), owner))?)?;

            let mut owner = owner;
            let mut active: transactions::ActiveModel = model.into();
            if let Some(reference) = required(draft.account, "account", mode)? {
                let account = resolve_account(&db_tx, &reference).await?;
                owner = account.account_owner;
                active.account_id = ActiveValue::Set(account.id);
            }
            if let Some(date) = required(draft.date, "date", mode)? {
                active.date = ActiveValue::Set(date);
            }
            if let Some(kind) = required(draft.kind, "type", mode)? {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(description) = draft.description {
                active.description = ActiveValue::Set(normalize_description(description)?);
            }
            if let Some(amount) = draft.amount {
                active.amount_minor = ActiveValue::Set(money::to_minor(amount)?);
            }
            if let Some(vendor) = draft.vendor {
                let vendor_id =
                    resolve_optional::<vendors::Entity>(&db_tx, vendor.as_ref(), "vendor").await?;
                active.vendor_id = ActiveValue::Set(vendor_id);
            }
            if let Some(category) = draft.category {
                let category_id =
                    resolve_optional::<categories::Entity>(&db_tx, category.as_ref(), "category")
                        .await?;
                active.category_id = ActiveValue::Set(category_id);
            }
            if let Some(paid_off) = draft.paid_off {
                active.paid_off = ActiveValue::Set(paid_off);
            }
            if let Some(recurring) = draft.recurring {
                active.recurring = ActiveValue::Set(recurring);
            }
            active.last_updated = ActiveValue::Set(Utc::now());

            let model = active.update(&db_tx).await?;
            tracing::info!(transaction = model.id, user = actor.id, "transaction updated");
            Transaction::try_from((model, owner))
        })
    }

    pub async fn delete_transaction(&self, actor: &Actor, transaction_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (model, owner) = load_with_owner(&db_tx, transaction_id).await?;
            self.require_access(actor, &Transaction::try_from((model.clone(), owner))?)?;

            model.delete(&db_tx).await?;
            tracing::info!(transaction = transaction_id, user = actor.id, "transaction deleted");
            Ok(())
        })
    }
}
