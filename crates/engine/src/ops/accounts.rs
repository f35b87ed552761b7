use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, Select, TransactionTrait, prelude::*};

use crate::{
    Account, AccountType, EngineError, ResultEngine,
    access::{Actor, Claims, Reference},
    accounts, money, users,
};

use super::{
    Engine, Page, PageRequest, WriteMode, normalize_required_name, required, resolve_reference,
    with_tx,
};

const NAME_MAX_LEN: usize = 50;

/// Account fields carried by a create or update request.
///
/// `account_owner` distinguishes "not sent" (`None`) from an explicit null
/// (`Some(None)`), which leaves the account without an owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountDraft {
    pub name: Option<String>,
    pub account_owner: Option<Option<Reference>>,
    pub current_balance: Option<Decimal>,
    pub account_type: Option<AccountType>,
    pub mortgage: Option<bool>,
    pub latest_transaction_id: Option<i64>,
}

impl AccountDraft {
    /// An explicit null owner is a claim on nobody, which only staff pass.
    fn claims(&self) -> Claims {
        Claims {
            account_owner: self
                .account_owner
                .clone()
                .map(|owner| owner.unwrap_or(Reference::Malformed)),
            account: None,
        }
    }
}

impl Engine {
    fn visible_accounts_query(actor: &Actor) -> Select<accounts::Entity> {
        let query = accounts::Entity::find().order_by_asc(accounts::Column::Id);
        if actor.is_admin() {
            query
        } else {
            query.filter(accounts::Column::AccountOwner.eq(actor.id))
        }
    }

    /// Lists the accounts `actor` may see: its own, or all for staff.
    pub async fn list_accounts(
        &self,
        actor: &Actor,
        request: PageRequest,
    ) -> ResultEngine<Page<Account>> {
        self.fetch_page(Self::visible_accounts_query(actor), request)
            .await?
            .try_map(Account::try_from)
    }

    pub(super) async fn visible_accounts(&self, actor: &Actor) -> ResultEngine<Vec<Account>> {
        Self::visible_accounts_query(actor)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub async fn account(&self, actor: &Actor, account_id: i64) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))?;
        let account = Account::try_from(model)?;
        self.require_access(actor, &account)?;
        Ok(account)
    }

    /// Creates an account.
    ///
    /// The owner defaults to `actor` when the draft names none. Only staff
    /// may create accounts for somebody else, or for nobody.
    pub async fn create_account(&self, actor: &Actor, draft: AccountDraft) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            self.authorize_claims(&db_tx, actor, &draft.claims()).await?;

            let name = draft.name.ok_or_else(|| EngineError::required("name"))?;
            let name = normalize_required_name(&name, "name", NAME_MAX_LEN)?;
            let balance = draft
                .current_balance
                .ok_or_else(|| EngineError::required("current_balance"))?;
            let account_type = draft
                .account_type
                .ok_or_else(|| EngineError::required("account_type"))?;
            let owner = match &draft.account_owner {
                Some(Some(reference)) => Some(
                    resolve_reference::<users::Entity>(&db_tx, reference, "account_owner").await?,
                ),
                Some(None) => None,
                None => Some(actor.id),
            };

            let now = Utc::now();
            let model = accounts::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                account_owner: ActiveValue::Set(owner),
                current_balance_minor: ActiveValue::Set(money::to_minor(balance)?),
                account_type: ActiveValue::Set(account_type.code().to_string()),
                mortgage: ActiveValue::Set(draft.mortgage.unwrap_or(false)),
                latest_transaction_id: ActiveValue::Set(draft.latest_transaction_id.unwrap_or(0)),
                created: ActiveValue::Set(now),
                last_updated: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(account = model.id, owner = ?owner, "account created");
            Account::try_from(model)
        })
    }

    /// Updates an account the actor owns (or any account, for staff).
    pub async fn update_account(
        &self,
        actor: &Actor,
        account_id: i64,
        draft: AccountDraft,
        mode: WriteMode,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            self.authorize_claims(&db_tx, actor, &draft.claims()).await?;

            let model = accounts::Entity::find_by_id(account_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))?;
            self.require_access(actor, &Account::try_from(model.clone())?)?;

            let mut active: accounts::ActiveModel = model.into();
            if let Some(name) = required(draft.name, "name", mode)? {
                let name = normalize_required_name(&name, "name", NAME_MAX_LEN)?;
                active.name = ActiveValue::Set(name);
            }
            if let Some(balance) = required(draft.current_balance, "current_balance", mode)? {
                active.current_balance_minor = ActiveValue::Set(money::to_minor(balance)?);
            }
            if let Some(account_type) = required(draft.account_type, "account_type", mode)? {
                active.account_type = ActiveValue::Set(account_type.code().to_string());
            }
            match &draft.account_owner {
                Some(Some(reference)) => {
                    let owner =
                        resolve_reference::<users::Entity>(&db_tx, reference, "account_owner")
                            .await?;
                    active.account_owner = ActiveValue::Set(Some(owner));
                }
                Some(None) => active.account_owner = ActiveValue::Set(None),
                None => {}
            }
            if let Some(mortgage) = draft.mortgage {
                active.mortgage = ActiveValue::Set(mortgage);
            }
            if let Some(latest) = draft.latest_transaction_id {
                active.latest_transaction_id = ActiveValue::Set(latest);
            }
            active.last_updated = ActiveValue::Set(Utc::now());

            let model = active.update(&db_tx).await?;
            tracing::info!(account = model.id, user = actor.id, "account updated");
            Account::try_from(model)
        })
    }

    /// Deletes an account together with all its transactions.
    pub async fn delete_account(&self, actor: &Actor, account_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))?;
            self.require_access(actor, &Account::try_from(model.clone())?)?;

            model.delete(&db_tx).await?;
            tracing::info!(account = account_id, user = actor.id, "account deleted");
            Ok(())
        })
    }
}
