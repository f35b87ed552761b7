use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, Group, ResultEngine, access::Actor, groups};

use super::{
    Engine, NameDraft, Page, PageRequest, WriteMode, existing_key, normalize_required_name,
    required, with_tx,
};

const NAME_MAX_LEN: usize = 150;

async fn ensure_name_free(
    db: &impl ConnectionTrait,
    name: &str,
    except: Option<i64>,
) -> ResultEngine<()> {
    let mut query = groups::Entity::find().filter(groups::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(groups::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(EngineError::ExistingKey(name.to_string()));
    }
    Ok(())
}

async fn insert_group(db: &impl ConnectionTrait, name: String) -> ResultEngine<groups::Model> {
    groups::ActiveModel {
        id: ActiveValue::NotSet,
        name: ActiveValue::Set(name.clone()),
    }
    .insert(db)
    .await
    .map_err(existing_key(&name))
}

impl Engine {
    pub async fn list_groups(&self, request: PageRequest) -> ResultEngine<Page<Group>> {
        let query = groups::Entity::find().order_by_asc(groups::Column::Id);
        Ok(self.fetch_page(query, request).await?.map(Group::from))
    }

    pub async fn group(&self, group_id: i64) -> ResultEngine<Group> {
        groups::Entity::find_by_id(group_id)
            .one(&self.database)
            .await?
            .map(Group::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("group {group_id}")))
    }

    /// Creates a group; staff only. Names are unique.
    pub async fn create_group(&self, actor: &Actor, draft: NameDraft) -> ResultEngine<Group> {
        self.require_admin(actor)?;
        let group = self.register_group(draft).await?;
        tracing::info!(group = group.id, user = actor.id, "group created");
        Ok(group)
    }

    /// Creates a group without an acting identity.
    pub async fn register_group(&self, draft: NameDraft) -> ResultEngine<Group> {
        let name = draft.name.ok_or_else(|| EngineError::required("name"))?;
        let name = normalize_required_name(&name, "name", NAME_MAX_LEN)?;

        with_tx!(self, |db_tx| {
            ensure_name_free(&db_tx, &name, None).await?;
            Ok(Group::from(insert_group(&db_tx, name).await?))
        })
    }

    pub async fn update_group(
        &self,
        actor: &Actor,
        group_id: i64,
        draft: NameDraft,
        mode: WriteMode,
    ) -> ResultEngine<Group> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = groups::Entity::find_by_id(group_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("group {group_id}")))?;

            let mut key = model.name.clone();
            let mut active: groups::ActiveModel = model.into();
            if let Some(name) = required(draft.name, "name", mode)? {
                let name = normalize_required_name(&name, "name", NAME_MAX_LEN)?;
                ensure_name_free(&db_tx, &name, Some(group_id)).await?;
                key = name.clone();
                active.name = ActiveValue::Set(name);
            }

            let model = active.update(&db_tx).await.map_err(existing_key(&key))?;
            tracing::info!(group = model.id, user = actor.id, "group updated");
            Ok(Group::from(model))
        })
    }

    /// Deletes a group and its memberships.
    pub async fn delete_group(&self, actor: &Actor, group_id: i64) -> ResultEngine<()> {
        self.require_admin(actor)?;
        let result = groups::Entity::delete_by_id(group_id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("group {group_id}")));
        }
        tracing::info!(group = group_id, user = actor.id, "group deleted");
        Ok(())
    }
}
