//! Users and their privilege flags.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::access::Actor;

/// A registered user.
///
/// The password never leaves the engine: it is only compared during
/// authentication.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<i64>,
    pub created: DateTime<Utc>,
}

impl User {
    /// The authorization identity of this user.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

impl From<(Model, Vec<i64>)> for User {
    fn from((model, groups): (Model, Vec<i64>)) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            groups,
            created: model.created,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
    #[sea_orm(has_many = "super::user_groups::Entity")]
    UserGroups,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::user_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserGroups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
