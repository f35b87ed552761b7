#![allow(dead_code)]

use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::Database;

use engine::{AccountDraft, AccountType, Actor, Engine, PageRequest, Privileges, UserDraft};
use migration::MigratorTrait;

pub async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

pub async fn user(engine: &Engine, username: &str) -> Actor {
    register(engine, username, Privileges::default()).await
}

pub async fn staff(engine: &Engine, username: &str) -> Actor {
    let privileges = Privileges {
        is_staff: true,
        is_superuser: false,
    };
    register(engine, username, privileges).await
}

async fn register(engine: &Engine, username: &str, privileges: Privileges) -> Actor {
    let draft = UserDraft {
        username: Some(username.to_string()),
        email: Some(format!("{username}@example.com")),
        password: Some("password".to_string()),
        groups: None,
    };
    engine
        .register_user(draft, privileges)
        .await
        .unwrap()
        .actor()
}

pub fn dec(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap()
}

pub fn account_draft(name: &str, balance: &str, account_type: AccountType) -> AccountDraft {
    AccountDraft {
        name: Some(name.to_string()),
        current_balance: Some(dec(balance)),
        account_type: Some(account_type),
        ..AccountDraft::default()
    }
}

pub fn first_page() -> PageRequest {
    PageRequest::new(1, 100)
}
