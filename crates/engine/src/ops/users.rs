use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, ResultEngine, User, access::Actor, groups, user_groups, users,
};

use super::{Engine, Page, PageRequest, WriteMode, existing_key, required, with_tx};

const USERNAME_MAX_LEN: usize = 150;

/// User fields carried by a create or update request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub groups: Option<Vec<i64>>,
}

/// Privilege flags, only settable outside the HTTP API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Privileges {
    pub is_staff: bool,
    pub is_superuser: bool,
}

fn validate_username(value: &str) -> ResultEngine<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EngineError::Validation(
            "username: this field may not be blank".to_string(),
        ));
    }
    if value.chars().count() > USERNAME_MAX_LEN {
        return Err(EngineError::Validation(format!(
            "username: ensure this field has no more than {USERNAME_MAX_LEN} characters"
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(EngineError::Validation(
            "username: may contain only letters, numbers, and @/./+/-/_ characters".to_string(),
        ));
    }
    Ok(value.to_string())
}

fn validate_email(value: &str) -> ResultEngine<String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }

    let valid = value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !value.chars().any(char::is_whitespace)
    });
    if !valid {
        return Err(EngineError::Validation(
            "email: enter a valid email address".to_string(),
        ));
    }
    Ok(value.to_string())
}

fn validate_password(value: &str) -> ResultEngine<String> {
    if value.is_empty() {
        return Err(EngineError::Validation(
            "password: this field may not be blank".to_string(),
        ));
    }
    Ok(value.to_string())
}

async fn group_ids(db: &impl ConnectionTrait, user_id: i64) -> ResultEngine<Vec<i64>> {
    Ok(user_groups::Entity::find()
        .filter(user_groups::Column::UserId.eq(user_id))
        .order_by_asc(user_groups::Column::GroupId)
        .all(db)
        .await?
        .into_iter()
        .map(|membership| membership.group_id)
        .collect())
}

async fn ensure_username_free(
    db: &DatabaseTransaction,
    username: &str,
    except: Option<i64>,
) -> ResultEngine<()> {
    let mut query = users::Entity::find().filter(users::Column::Username.eq(username));
    if let Some(id) = except {
        query = query.filter(users::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(username.to_string()));
    }
    Ok(())
}

async fn insert_user(
    db: &impl ConnectionTrait,
    username: String,
    email: String,
    password: String,
    privileges: Privileges,
) -> ResultEngine<users::Model> {
    users::ActiveModel {
        id: ActiveValue::NotSet,
        username: ActiveValue::Set(username.clone()),
        email: ActiveValue::Set(email),
        password: ActiveValue::Set(password),
        is_staff: ActiveValue::Set(privileges.is_staff),
        is_superuser: ActiveValue::Set(privileges.is_superuser),
        created: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
    .map_err(existing_key(&username))
}

async fn replace_groups(db: &DatabaseTransaction, user_id: i64, group_ids: &[i64]) -> ResultEngine<()> {
    for group_id in group_ids {
        if groups::Entity::find_by_id(*group_id).one(db).await?.is_none() {
            return Err(EngineError::Validation(format!(
                "groups: invalid pk \"{group_id}\", object does not exist"
            )));
        }
    }

    user_groups::Entity::delete_many()
        .filter(user_groups::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    let mut unique = group_ids.to_vec();
    unique.sort_unstable();
    unique.dedup();
    for group_id in unique {
        user_groups::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            group_id: ActiveValue::Set(group_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

impl Engine {
    /// Looks up the user matching a username/password pair.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Option<User>> {
        let Some(model) = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::Password.eq(password))
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        let groups = group_ids(&self.database, model.id).await?;
        Ok(Some(User::from((model, groups))))
    }

    /// Staff see every user; everybody else only themselves.
    pub async fn list_users(&self, actor: &Actor, request: PageRequest) -> ResultEngine<Page<User>> {
        let mut query = users::Entity::find().order_by_asc(users::Column::Id);
        if !actor.is_admin() {
            query = query.filter(users::Column::Id.eq(actor.id));
        }
        let page = self.fetch_page(query, request).await?;

        let ids: Vec<i64> = page.items.iter().map(|user| user.id).collect();
        let mut memberships: HashMap<i64, Vec<i64>> = HashMap::new();
        for membership in user_groups::Entity::find()
            .filter(user_groups::Column::UserId.is_in(ids))
            .order_by_asc(user_groups::Column::GroupId)
            .all(&self.database)
            .await?
        {
            memberships
                .entry(membership.user_id)
                .or_default()
                .push(membership.group_id);
        }

        Ok(page.map(|model| {
            let groups = memberships.remove(&model.id).unwrap_or_default();
            User::from((model, groups))
        }))
    }

    pub async fn user(&self, actor: &Actor, user_id: i64) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;
        if !actor.is_admin() && actor.id != user_id {
            return Err(EngineError::forbidden());
        }
        let groups = group_ids(&self.database, model.id).await?;
        Ok(User::from((model, groups)))
    }

    /// Creates a user through the API; staff only.
    pub async fn create_user(&self, actor: &Actor, draft: UserDraft) -> ResultEngine<User> {
        self.require_admin(actor)?;
        self.register_user(draft, Privileges::default()).await
    }

    /// Creates a user without an acting identity, e.g. to bootstrap the
    /// first superuser.
    pub async fn register_user(&self, draft: UserDraft, privileges: Privileges) -> ResultEngine<User> {
        let username = draft
            .username
            .ok_or_else(|| EngineError::required("username"))?;
        let username = validate_username(&username)?;
        let password = draft
            .password
            .ok_or_else(|| EngineError::required("password"))?;
        let password = validate_password(&password)?;
        let email = validate_email(draft.email.as_deref().unwrap_or_default())?;

        with_tx!(self, |db_tx| {
            ensure_username_free(&db_tx, &username, None).await?;

            let model = insert_user(&db_tx, username, email, password, privileges).await?;

            let groups = draft.groups.unwrap_or_default();
            replace_groups(&db_tx, model.id, &groups).await?;
            let groups = group_ids(&db_tx, model.id).await?;

            tracing::info!(user = model.id, username = %model.username, "user created");
            Ok(User::from((model, groups)))
        })
    }

    /// Updates a user; users may update themselves, staff anybody.
    pub async fn update_user(
        &self,
        actor: &Actor,
        user_id: i64,
        draft: UserDraft,
        mode: WriteMode,
    ) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))?;
            if !actor.is_admin() && actor.id != user_id {
                return Err(EngineError::forbidden());
            }

            let mut key = model.username.clone();
            let mut active: users::ActiveModel = model.into();
            if let Some(username) = required(draft.username, "username", mode)? {
                let username = validate_username(&username)?;
                ensure_username_free(&db_tx, &username, Some(user_id)).await?;
                key = username.clone();
                active.username = ActiveValue::Set(username);
            }
            if let Some(email) = draft.email {
                active.email = ActiveValue::Set(validate_email(&email)?);
            }
            if let Some(password) = draft.password {
                active.password = ActiveValue::Set(validate_password(&password)?);
            }
            let model = active.update(&db_tx).await.map_err(existing_key(&key))?;

            if let Some(groups) = draft.groups {
                replace_groups(&db_tx, user_id, &groups).await?;
            }
            let groups = group_ids(&db_tx, user_id).await?;

            tracing::info!(user = user_id, by = actor.id, "user updated");
            Ok(User::from((model, groups)))
        })
    }

    /// Deletes a user; their accounts stay, with no owner.
    pub async fn delete_user(&self, actor: &Actor, user_id: i64) -> ResultEngine<()> {
        self.require_admin(actor)?;
        let result = users::Entity::delete_by_id(user_id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("user {user_id}")));
        }
        tracing::info!(user = user_id, by = actor.id, "user deleted");
        Ok(())
    }
}
