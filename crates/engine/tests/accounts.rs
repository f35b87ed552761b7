mod common;

use engine::{
    AccountDraft, AccountType, EngineError, NameDraft, PageRequest, Reference, UserDraft,
    WriteMode,
};

use common::{account_draft, dec, engine_with_db, first_page, staff, user};

#[tokio::test]
async fn account_defaults_to_its_creator() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;

    let account = engine
        .create_account(&alice, account_draft("Wallet", "30.00", AccountType::Cash))
        .await
        .unwrap();

    assert_eq!(account.account_owner, Some(alice.id));
    assert_eq!(account.current_balance, dec("30.00"));
    assert_eq!(account.latest_transaction_id, 0);
    assert!(!account.mortgage);
}

#[tokio::test]
async fn account_type_code_round_trips() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;

    let created = engine
        .create_account(&alice, account_draft("Wallet", "1", AccountType::Cash))
        .await
        .unwrap();
    let fetched = engine.account(&alice, created.id).await.unwrap();

    assert_eq!(fetched.account_type, AccountType::Cash);
    assert_eq!(fetched.account_type.code(), "C");
}

#[tokio::test]
async fn users_cannot_create_accounts_for_somebody_else() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;

    let draft = AccountDraft {
        account_owner: Some(Some(Reference::Id(bob.id))),
        ..account_draft("Sneaky", "10.00", AccountType::Asset)
    };
    let err = engine.create_account(&alice, draft).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let bob_accounts = engine.list_accounts(&bob, first_page()).await.unwrap();
    assert_eq!(bob_accounts.count, 0);
}

#[tokio::test]
async fn malformed_owner_is_denied_for_users_and_invalid_for_staff() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let admin = staff(&engine, "admin").await;

    let draft = AccountDraft {
        account_owner: Some(Some(Reference::parse("not-a-user"))),
        ..account_draft("Broken", "1.00", AccountType::Cash)
    };

    let err = engine.create_account(&alice, draft.clone()).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine.create_account(&admin, draft).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn owner_claim_matching_actor_is_allowed() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;

    let draft = AccountDraft {
        account_owner: Some(Some(Reference::parse(&format!(
            "http://host/users/{}/",
            alice.id
        )))),
        ..account_draft("Mine", "5.00", AccountType::Savings)
    };
    let account = engine.create_account(&alice, draft).await.unwrap();
    assert_eq!(account.account_owner, Some(alice.id));
}

#[tokio::test]
async fn only_the_owner_or_staff_reach_an_account() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let admin = staff(&engine, "admin").await;

    let account = engine
        .create_account(&alice, account_draft("Checking", "100.00", AccountType::Asset))
        .await
        .unwrap();

    assert!(matches!(
        engine.account(&bob, account.id).await,
        Err(EngineError::Forbidden(_))
    ));
    let rename = AccountDraft {
        name: Some("Mine now".to_string()),
        ..AccountDraft::default()
    };
    assert!(matches!(
        engine
            .update_account(&bob, account.id, rename.clone(), WriteMode::Partial)
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.delete_account(&bob, account.id).await,
        Err(EngineError::Forbidden(_))
    ));

    let renamed = engine
        .update_account(&alice, account.id, rename, WriteMode::Partial)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Mine now");
    assert_eq!(renamed.current_balance, dec("100.00"));

    engine.account(&admin, account.id).await.unwrap();
    engine.delete_account(&admin, account.id).await.unwrap();
    assert!(matches!(
        engine.account(&alice, account.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn staff_can_reassign_an_account() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let carol = user(&engine, "carol").await;
    let admin = staff(&engine, "admin").await;

    let account = engine
        .create_account(&alice, account_draft("Shared", "12.00", AccountType::Cash))
        .await
        .unwrap();

    let reassign = AccountDraft {
        account_owner: Some(Some(Reference::Id(carol.id))),
        ..AccountDraft::default()
    };
    let updated = engine
        .update_account(&admin, account.id, reassign.clone(), WriteMode::Partial)
        .await
        .unwrap();
    assert_eq!(updated.account_owner, Some(carol.id));

    // Carol may not hand it back to Alice.
    let back = AccountDraft {
        account_owner: Some(Some(Reference::Id(alice.id))),
        ..AccountDraft::default()
    };
    assert!(matches!(
        engine
            .update_account(&carol, account.id, back, WriteMode::Partial)
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.account(&alice, account.id).await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn only_staff_may_leave_an_account_unowned() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let admin = staff(&engine, "admin").await;
    let unowned = AccountDraft {
        account_owner: Some(None),
        ..account_draft("Unowned", "3.00", AccountType::Cash)
    };

    assert!(matches!(
        engine.create_account(&alice, unowned.clone()).await,
        Err(EngineError::Forbidden(_))
    ));
    let created = engine.create_account(&admin, unowned).await.unwrap();
    assert_eq!(created.account_owner, None);

    let account = engine
        .create_account(&alice, account_draft("Owned", "3.00", AccountType::Cash))
        .await
        .unwrap();
    let clear = AccountDraft {
        account_owner: Some(None),
        ..AccountDraft::default()
    };
    assert!(matches!(
        engine
            .update_account(&alice, account.id, clear.clone(), WriteMode::Partial)
            .await,
        Err(EngineError::Forbidden(_))
    ));
    let cleared = engine
        .update_account(&admin, account.id, clear, WriteMode::Partial)
        .await
        .unwrap();
    assert_eq!(cleared.account_owner, None);

    let untouched = engine
        .update_account(&admin, created.id, AccountDraft::default(), WriteMode::Partial)
        .await
        .unwrap();
    assert_eq!(untouched.account_owner, None);
}

#[tokio::test]
async fn full_update_requires_every_required_field() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let account = engine
        .create_account(&alice, account_draft("Wallet", "1.00", AccountType::Cash))
        .await
        .unwrap();

    let partial = AccountDraft {
        name: Some("Only name".to_string()),
        ..AccountDraft::default()
    };
    let err = engine
        .update_account(&alice, account.id, partial, WriteMode::Full)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("current_balance: this field is required".to_string())
    );

    let full = account_draft("Renamed", "2.50", AccountType::Debt);
    let updated = engine
        .update_account(&alice, account.id, full, WriteMode::Full)
        .await
        .unwrap();
    assert_eq!(updated.account_type, AccountType::Debt);
    assert_eq!(updated.current_balance, dec("2.50"));
}

#[tokio::test]
async fn balances_are_validated() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;

    let err = engine
        .create_account(&alice, account_draft("Odd", "1.005", AccountType::Cash))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_account(&alice, account_draft("Huge", "123456789.00", AccountType::Cash))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .create_account(
            &alice,
            account_draft("Overflow", "79228162514264337593543950335", AccountType::Cash),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let nameless = AccountDraft {
        name: None,
        ..account_draft("", "1.00", AccountType::Cash)
    };
    assert!(matches!(
        engine.create_account(&alice, nameless).await,
        Err(EngineError::Validation(_))
    ));
}

#[tokio::test]
async fn lists_show_only_owned_accounts() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let admin = staff(&engine, "admin").await;

    for name in ["a", "b", "c"] {
        engine
            .create_account(&alice, account_draft(name, "1.00", AccountType::Cash))
            .await
            .unwrap();
    }
    engine
        .create_account(&bob, account_draft("d", "1.00", AccountType::Cash))
        .await
        .unwrap();

    let page = engine
        .list_accounts(&alice, PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.count, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page.has_next());
    assert!(page.items.iter().all(|account| account.account_owner == Some(alice.id)));

    let second = engine
        .list_accounts(&alice, PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_next());

    assert!(matches!(
        engine.list_accounts(&alice, PageRequest::new(3, 2)).await,
        Err(EngineError::KeyNotFound(_))
    ));

    let all = engine.list_accounts(&admin, first_page()).await.unwrap();
    assert_eq!(all.count, 4);
}

#[tokio::test]
async fn deleting_a_user_orphans_their_accounts() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let admin = staff(&engine, "admin").await;

    let account = engine
        .create_account(&alice, account_draft("Left behind", "9.99", AccountType::Savings))
        .await
        .unwrap();
    engine.delete_user(&admin, alice.id).await.unwrap();

    let orphan = engine.account(&admin, account.id).await.unwrap();
    assert_eq!(orphan.account_owner, None);
}

#[tokio::test]
async fn dashboard_excludes_mortgages_from_totals() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    let admin = staff(&engine, "admin").await;

    let a1 = engine
        .create_account(&alice, account_draft("a1", "30.00", AccountType::Cash))
        .await
        .unwrap();
    let mortgage = AccountDraft {
        mortgage: Some(true),
        ..account_draft("a2", "50.00", AccountType::Cash)
    };
    let a2 = engine.create_account(&alice, mortgage).await.unwrap();
    engine
        .create_account(&bob, account_draft("b1", "70.00", AccountType::Cash))
        .await
        .unwrap();

    let summary = engine.dashboard(&alice).await.unwrap();
    let cash = summary.bucket(AccountType::Cash);
    let ids = |accounts: &[engine::Account]| accounts.iter().map(|a| a.id).collect::<Vec<_>>();
    assert_eq!(ids(&cash.accounts), vec![a1.id]);
    assert_eq!(cash.total, dec("30.00"));
    assert_eq!(ids(&summary.mortgage), vec![a2.id]);
    assert_eq!(summary.bucket(AccountType::Debt).total, dec("0"));

    let everything = engine.dashboard(&admin).await.unwrap();
    assert_eq!(everything.bucket(AccountType::Cash).total, dec("100.00"));
    assert_eq!(everything.mortgage.len(), 1);
}

#[tokio::test]
async fn user_management_is_reserved_to_staff() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let admin = staff(&engine, "admin").await;

    let draft = UserDraft {
        username: Some("newcomer".to_string()),
        email: Some("new@example.com".to_string()),
        password: Some("secret".to_string()),
        groups: None,
    };
    assert!(matches!(
        engine.create_user(&alice, draft.clone()).await,
        Err(EngineError::Forbidden(_))
    ));

    let created = engine.create_user(&admin, draft.clone()).await.unwrap();
    assert!(!created.is_staff);
    assert!(matches!(
        engine.create_user(&admin, draft).await,
        Err(EngineError::ExistingKey(_))
    ));

    let invalid = UserDraft {
        username: Some("broken".to_string()),
        email: Some("invalid-email".to_string()),
        password: Some("secret".to_string()),
        groups: None,
    };
    assert!(matches!(
        engine.create_user(&admin, invalid).await,
        Err(EngineError::Validation(_))
    ));

    let visible = engine.list_users(&alice, first_page()).await.unwrap();
    assert_eq!(visible.count, 1);
    assert_eq!(visible.items[0].id, alice.id);
    assert_eq!(engine.list_users(&admin, first_page()).await.unwrap().count, 3);

    assert!(matches!(
        engine.user(&alice, created.id).await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.delete_user(&alice, created.id).await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn users_update_themselves_and_authenticate() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;

    let change = UserDraft {
        password: Some("new-password".to_string()),
        ..UserDraft::default()
    };
    engine
        .update_user(&alice, alice.id, change.clone(), WriteMode::Partial)
        .await
        .unwrap();
    assert!(matches!(
        engine
            .update_user(&alice, bob.id, change, WriteMode::Partial)
            .await,
        Err(EngineError::Forbidden(_))
    ));

    assert!(engine.authenticate("alice", "password").await.unwrap().is_none());
    let authenticated = engine
        .authenticate("alice", "new-password")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(authenticated.actor(), alice);

    let taken = UserDraft {
        username: Some("bob".to_string()),
        ..UserDraft::default()
    };
    assert!(matches!(
        engine
            .update_user(&alice, alice.id, taken, WriteMode::Partial)
            .await,
        Err(EngineError::ExistingKey(_))
    ));
}

#[tokio::test]
async fn groups_are_unique_and_staff_managed() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let admin = staff(&engine, "admin").await;
    let name = || NameDraft {
        name: Some("family".to_string()),
    };

    assert!(matches!(
        engine.create_group(&alice, name()).await,
        Err(EngineError::Forbidden(_))
    ));
    let group = engine.create_group(&admin, name()).await.unwrap();
    assert!(matches!(
        engine.create_group(&admin, name()).await,
        Err(EngineError::ExistingKey(_))
    ));

    let join = UserDraft {
        groups: Some(vec![group.id]),
        ..UserDraft::default()
    };
    let member = engine
        .update_user(&admin, alice.id, join, WriteMode::Partial)
        .await
        .unwrap();
    assert_eq!(member.groups, vec![group.id]);

    assert_eq!(engine.list_groups(first_page()).await.unwrap().count, 1);
    engine.delete_group(&admin, group.id).await.unwrap();
    assert!(engine.user(&alice, alice.id).await.unwrap().groups.is_empty());
}

#[tokio::test]
async fn reference_data_is_shared() {
    let engine = engine_with_db().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;

    let category = engine
        .create_category(
            &alice,
            NameDraft {
                name: Some("  Groceries ".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(category.name, "Groceries");

    let renamed = engine
        .update_category(
            &bob,
            category.id,
            NameDraft {
                name: Some("Food".to_string()),
            },
            WriteMode::Full,
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Food");

    let vendor = engine
        .create_vendor(
            &bob,
            NameDraft {
                name: Some("Corner shop".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(engine.vendor(vendor.id).await.unwrap().name, "Corner shop");

    engine.delete_vendor(&alice, vendor.id).await.unwrap();
    assert!(matches!(
        engine.vendor(vendor.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine
            .create_vendor(&alice, NameDraft { name: None })
            .await,
        Err(EngineError::Validation(_))
    ));
}
