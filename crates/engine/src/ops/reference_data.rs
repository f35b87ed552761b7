//! Categories and vendors: shared, name-only reference data any
//! authenticated user may manage.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Category, EngineError, ResultEngine, Vendor, access::Actor, categories, vendors,
};

use super::{
    Engine, NameDraft, Page, PageRequest, WriteMode, normalize_required_name, required, with_tx,
};

const NAME_MAX_LEN: usize = 100;

/// Generates list/get/create/update/delete methods for a name-only entity.
macro_rules! impl_named_resource {
    (
        $module:ident,
        $domain:ident,
        $label:literal,
        $list_fn:ident,
        $get_fn:ident,
        $create_fn:ident,
        $update_fn:ident,
        $delete_fn:ident
    ) => {
        impl Engine {
            pub async fn $list_fn(&self, request: PageRequest) -> ResultEngine<Page<$domain>> {
                let query = $module::Entity::find().order_by_asc($module::Column::Id);
                Ok(self.fetch_page(query, request).await?.map($domain::from))
            }

            pub async fn $get_fn(&self, id: i64) -> ResultEngine<$domain> {
                $module::Entity::find_by_id(id)
                    .one(&self.database)
                    .await?
                    .map($domain::from)
                    .ok_or_else(|| EngineError::KeyNotFound(format!(concat!($label, " {}"), id)))
            }

            pub async fn $create_fn(&self, actor: &Actor, draft: NameDraft) -> ResultEngine<$domain> {
                let name = draft.name.ok_or_else(|| EngineError::required("name"))?;
                let name = normalize_required_name(&name, "name", NAME_MAX_LEN)?;
                let now = Utc::now();
                let model = $module::ActiveModel {
                    id: ActiveValue::NotSet,
                    name: ActiveValue::Set(name),
                    created: ActiveValue::Set(now),
                    last_updated: ActiveValue::Set(now),
                }
                .insert(&self.database)
                .await?;

                tracing::info!(id = model.id, user = actor.id, resource = $label, "created");
                Ok($domain::from(model))
            }

            pub async fn $update_fn(
                &self,
                actor: &Actor,
                id: i64,
                draft: NameDraft,
                mode: WriteMode,
            ) -> ResultEngine<$domain> {
                with_tx!(self, |db_tx| {
                    let model = $module::Entity::find_by_id(id)
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| {
                            EngineError::KeyNotFound(format!(concat!($label, " {}"), id))
                        })?;

                    let mut active: $module::ActiveModel = model.into();
                    if let Some(name) = required(draft.name, "name", mode)? {
                        let name = normalize_required_name(&name, "name", NAME_MAX_LEN)?;
                        active.name = ActiveValue::Set(name);
                    }
                    active.last_updated = ActiveValue::Set(Utc::now());

                    let model = active.update(&db_tx).await?;
                    tracing::info!(id = model.id, user = actor.id, resource = $label, "updated");
                    Ok($domain::from(model))
                })
            }

            /// Deletes the row; transactions referencing it keep existing with
            /// the reference cleared.
            pub async fn $delete_fn(&self, actor: &Actor, id: i64) -> ResultEngine<()> {
                let result = $module::Entity::delete_by_id(id)
                    .exec(&self.database)
                    .await?;
                if result.rows_affected == 0 {
                    return Err(EngineError::KeyNotFound(format!(concat!($label, " {}"), id)));
                }
                tracing::info!(id, user = actor.id, resource = $label, "deleted");
                Ok(())
            }
        }
    };
}

impl_named_resource!(
    categories,
    Category,
    "category",
    list_categories,
    category,
    create_category,
    update_category,
    delete_category
);

impl_named_resource!(
    vendors,
    Vendor,
    "vendor",
    list_vendors,
    vendor,
    create_vendor,
    update_vendor,
    delete_vendor
);
