use sea_orm::{ConnectionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine,
    access::{self, Actor, Claims, Decision, Owned},
    accounts,
};

use super::Engine;

impl Engine {
    /// Phase 1: checks the ownership a write payload claims.
    ///
    /// A claimed account that does not exist is a denial, never a not-found.
    pub(super) async fn authorize_claims(
        &self,
        db: &impl ConnectionTrait,
        actor: &Actor,
        claims: &Claims,
    ) -> ResultEngine<()> {
        let allowed = match access::check_claims(actor, claims) {
            Decision::Allow => true,
            Decision::Deny => false,
            Decision::ResolveAccount(account_id) => {
                let owner = accounts::Entity::find_by_id(account_id)
                    .one(db)
                    .await?
                    .map(|account| account.account_owner);
                access::owns_resolved(actor, owner)
            }
        };

        if !allowed {
            tracing::warn!(user = actor.id, ?claims, "write denied by ownership claim");
            return Err(EngineError::forbidden());
        }
        Ok(())
    }

    /// Phase 2: checks a loaded account or transaction.
    pub(super) fn require_access(&self, actor: &Actor, object: &impl Owned) -> ResultEngine<()> {
        if access::can_access(actor, object) {
            return Ok(());
        }
        tracing::warn!(user = actor.id, ownership = ?object.ownership(), "object access denied");
        Err(EngineError::forbidden())
    }

    /// Only staff and superusers pass.
    pub(super) fn require_admin(&self, actor: &Actor) -> ResultEngine<()> {
        if actor.is_admin() {
            return Ok(());
        }
        tracing::warn!(user = actor.id, "admin-only action denied");
        Err(EngineError::forbidden())
    }
}
