use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, Privileges, UserDraft};
use migration::MigratorTrait;

const PASSWORD: &str = "password";

async fn app_with_users() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    for (username, is_staff) in [("alice", false), ("bob", false), ("admin", true)] {
        let draft = UserDraft {
            username: Some(username.to_string()),
            password: Some(PASSWORD.to_string()),
            ..UserDraft::default()
        };
        let privileges = Privileges {
            is_staff,
            is_superuser: false,
        };
        engine.register_user(draft, privileges).await.unwrap();
    }

    server::app(engine, 10)
}

fn basic(username: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{PASSWORD}")))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(header::AUTHORIZATION, basic(user));
    }
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_account(app: &Router, user: &str, body: Value) -> Value {
    let (status, account) = call(app, "POST", "/accounts/", Some(user), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{account}");
    account
}

#[tokio::test]
async fn unauthenticated_requests_are_forbidden() {
    let app = app_with_users().await;

    let (status, body) = call(&app, "GET", "/accounts/", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .uri("/accounts/")
        .header(header::AUTHORIZATION, basic("mallory"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn account_lifecycle() {
    let app = app_with_users().await;

    let account = create_account(
        &app,
        "alice",
        json!({"name": "Wallet", "current_balance": "30.00", "account_type": "C"}),
    )
    .await;
    assert_eq!(account["account_type"], "C");
    assert_eq!(account["current_balance"], "30.00");
    assert_eq!(account["account_owner"], 1);
    let id = account["id"].as_i64().unwrap();
    assert_eq!(account["url"], format!("/accounts/{id}/"));

    let (status, fetched) = call(&app, "GET", &format!("/accounts/{id}"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Wallet");

    let (status, _) = call(&app, "GET", &format!("/accounts/{id}/"), Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, patched) = call(
        &app,
        "PATCH",
        &format!("/accounts/{id}/"),
        Some("alice"),
        Some(json!({"mortgage": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["mortgage"], true);

    let (status, _) = call(&app, "DELETE", &format!("/accounts/{id}/"), Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, "DELETE", &format!("/accounts/{id}/"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = call(&app, "GET", &format!("/accounts/{id}/"), Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_owner_claims_are_forbidden_but_staff_may_reassign() {
    let app = app_with_users().await;
    let account = create_account(
        &app,
        "alice",
        json!({"name": "Savings", "current_balance": 5, "account_type": "S"}),
    )
    .await;
    let id = account["id"].as_i64().unwrap();

    let (status, _) = call(
        &app,
        "POST",
        "/accounts/",
        Some("alice"),
        Some(json!({
            "name": "Bob's",
            "current_balance": "1.00",
            "account_type": "A",
            "account_owner": "/users/2/"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reassigned) = call(
        &app,
        "PATCH",
        &format!("/accounts/{id}/"),
        Some("admin"),
        Some(json!({"account_owner": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reassigned["account_owner"], 2);

    let (status, _) = call(&app, "GET", &format!("/accounts/{id}/"), Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn transactions_follow_account_ownership() {
    let app = app_with_users().await;
    let bobs = create_account(
        &app,
        "bob",
        json!({"name": "Bob's", "current_balance": "10.00", "account_type": "C"}),
    )
    .await;
    let alices = create_account(
        &app,
        "alice",
        json!({"name": "Alice's", "current_balance": "10.00", "account_type": "C"}),
    )
    .await;

    let payload = |account: &Value| {
        json!({
            "account": account["url"],
            "date": "2024-03-01",
            "amount": "4.20",
            "type": "DEC",
            "description": "coffee"
        })
    };

    let (status, _) = call(&app, "POST", "/transactions/", Some("alice"), Some(payload(&bobs))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, listed) = call(&app, "GET", "/transactions/", Some("admin"), None).await;
    assert_eq!(listed["count"], 0);

    let (status, created) =
        call(&app, "POST", "/transactions/", Some("alice"), Some(payload(&alices))).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["display_amount"], "-$4.20");
    assert_eq!(created["account"], alices["url"]);
    assert_eq!(created["vendor"], Value::Null);
    assert_eq!(created["type"], "DEC");

    let (_, account) = call(&app, "GET", alices["url"].as_str().unwrap(), Some("alice"), None).await;
    assert_eq!(account["latest_transaction_id"], created["id"]);
    assert_eq!(account["current_balance"], "10.00");

    let url = created["url"].as_str().unwrap();
    let (status, _) = call(&app, "GET", url, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, "GET", url, Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, bob_list) = call(&app, "GET", "/transactions/", Some("bob"), None).await;
    assert_eq!(bob_list["count"], 0);
}

#[tokio::test]
async fn dashboard_groups_balances() {
    let app = app_with_users().await;
    create_account(
        &app,
        "alice",
        json!({"name": "a1", "current_balance": "30.00", "account_type": "C"}),
    )
    .await;
    create_account(
        &app,
        "alice",
        json!({"name": "a2", "current_balance": "50.00", "account_type": "C", "mortgage": true}),
    )
    .await;

    let (status, dashboard) = call(&app, "GET", "/dashboard/", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["total_cash"], "30.00");
    assert_eq!(dashboard["cash_accounts"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["cash_accounts"][0]["name"], "a1");
    assert_eq!(dashboard["mortgage"][0]["name"], "a2");
    assert_eq!(dashboard["asset_accounts"], json!([]));
    assert_eq!(dashboard["total_debt"], "0.00");

    let (_, empty) = call(&app, "GET", "/dashboard", Some("bob"), None).await;
    assert_eq!(empty["total_cash"], "0.00");
    assert_eq!(empty["mortgage"], json!([]));
}

#[tokio::test]
async fn user_payloads_are_validated() {
    let app = app_with_users().await;

    let (status, _) = call(
        &app,
        "POST",
        "/users/",
        Some("alice"),
        Some(json!({"username": "eve", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        "POST",
        "/users/",
        Some("admin"),
        Some(json!({"username": "", "email": "invalid-email", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, created) = call(
        &app,
        "POST",
        "/users/",
        Some("admin"),
        Some(json!({"username": "eve", "email": "eve@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("password").is_none());

    let (status, _) = call(
        &app,
        "POST",
        "/users/",
        Some("admin"),
        Some(json!({"username": "eve", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = call(&app, "GET", "/users/", Some("alice"), None).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["results"][0]["username"], "alice");
    let (_, listed) = call(&app, "GET", "/users/", Some("admin"), None).await;
    assert_eq!(listed["count"], 4);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app_with_users().await;

    let request = Request::builder()
        .method("POST")
        .uri("/accounts/")
        .header(header::AUTHORIZATION, basic("alice"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/accounts/",
        Some("alice"),
        Some(json!({"name": "Bad", "current_balance": "1.00", "account_type": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collections_are_paginated() {
    let app = app_with_users().await;
    for index in 0..12 {
        let (status, _) = call(
            &app,
            "POST",
            "/category/",
            Some("bob"),
            Some(json!({"name": format!("category {index}")})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = call(&app, "GET", "/category/", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["count"], 12);
    assert_eq!(first["results"].as_array().unwrap().len(), 10);
    assert_eq!(first["next"], "/category/?page=2");
    assert_eq!(first["previous"], Value::Null);

    let (_, second) = call(&app, "GET", "/category/?page=2", Some("alice"), None).await;
    assert_eq!(second["results"].as_array().unwrap().len(), 2);
    assert_eq!(second["previous"], "/category/?page=1");

    let (status, _) = call(&app, "GET", "/category/?page=9", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn groups_are_managed_by_staff() {
    let app = app_with_users().await;

    let (status, _) = call(&app, "POST", "/groups/", Some("alice"), Some(json!({"name": "family"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, group) =
        call(&app, "POST", "/groups/", Some("admin"), Some(json!({"name": "family"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(&app, "POST", "/groups/", Some("admin"), Some(json!({"name": "family"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, fetched) = call(&app, "GET", group["url"].as_str().unwrap(), Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "family");
}

#[tokio::test]
async fn oversized_amounts_are_bad_requests() {
    let app = app_with_users().await;

    let (status, body) = call(
        &app,
        "POST",
        "/accounts/",
        Some("alice"),
        Some(json!({
            "name": "Huge",
            "current_balance": "79228162514264337593543950335",
            "account_type": "C"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let account = create_account(
        &app,
        "alice",
        json!({"name": "Wallet", "current_balance": "1.00", "account_type": "C"}),
    )
    .await;
    let (status, _) = call(
        &app,
        "POST",
        "/transactions/",
        Some("alice"),
        Some(json!({
            "account": account["id"],
            "date": "2024-03-01",
            "amount": "-7922816251426433759354395033",
            "type": "INC"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn null_owner_is_reserved_to_staff() {
    let app = app_with_users().await;
    let unowned = json!({
        "name": "Unowned",
        "current_balance": "1.00",
        "account_type": "A",
        "account_owner": null
    });

    let (status, _) = call(&app, "POST", "/accounts/", Some("alice"), Some(unowned.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let created = create_account(&app, "admin", unowned).await;
    assert_eq!(created["account_owner"], Value::Null);

    let owned = create_account(
        &app,
        "alice",
        json!({"name": "Owned", "current_balance": "1.00", "account_type": "A"}),
    )
    .await;
    let url = owned["url"].as_str().unwrap();
    let (status, cleared) = call(
        &app,
        "PATCH",
        url,
        Some("admin"),
        Some(json!({"account_owner": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["account_owner"], Value::Null);

    let (status, _) = call(&app, "GET", url, Some("alice"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
