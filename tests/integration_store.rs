//! Integration tests for the ledger store CRUD operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use simple_bank::store::{
    CreateEntryParams, CreateTransferParams, ListAccountsParams, ListEntriesParams,
    ListTransfersParams, Page, Queries, StoreError, UpdateAccountParams,
};
use simple_bank::util::random;
use std::collections::HashSet;
use uuid::Uuid;

mod common;

fn assert_within_second(a: DateTime<Utc>, b: DateTime<Utc>) {
    assert!((a - b).num_milliseconds().abs() < 1000, "{} vs {}", a, b);
}

// =========================================================================
// Accounts
// =========================================================================

#[tokio::test]
async fn test_create_and_get_account() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let created = common::create_random_account(&store, &mut rng).await;
    assert!(!created.owner.is_empty());
    assert!(created.country_code.is_some());

    let mut conn = store.acquire().await.unwrap();
    let fetched = conn.get_account(created.id).await.unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.owner, created.owner);
    assert_eq!(fetched.balance, created.balance);
    assert_eq!(fetched.currency, created.currency);
    assert_eq!(fetched.country_code, created.country_code);
    assert_within_second(fetched.created_at, created.created_at);

    common::cleanup_accounts(&store, &[created.id]).await;
}

#[tokio::test]
async fn test_create_account_requires_owner() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let mut params = random::random_account_params(&mut rng, 100);
    params.owner = "  ".to_string();

    let mut conn = store.acquire().await.unwrap();
    let err = conn.create_account(&params).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_update_account() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let account = common::create_account(&store, &mut rng, dec!(10.00)).await;

    let mut conn = store.acquire().await.unwrap();
    let updated = conn
        .update_account(&UpdateAccountParams {
            id: account.id,
            balance: dec!(99.99),
        })
        .await
        .unwrap();

    assert_eq!(updated.id, account.id);
    assert_eq!(updated.balance, dec!(99.99));
    assert_eq!(updated.owner, account.owner);
    assert_eq!(updated.currency, account.currency);
    assert_within_second(updated.created_at, account.created_at);

    common::cleanup_accounts(&store, &[account.id]).await;
}

#[tokio::test]
async fn test_add_account_balance_is_relative() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let account = common::create_account(&store, &mut rng, dec!(10.00)).await;

    let mut conn = store.acquire().await.unwrap();
    let after_debit = conn.add_account_balance(account.id, dec!(-2.50)).await.unwrap();
    assert_eq!(after_debit.balance, dec!(7.50));
    let after_credit = conn.add_account_balance(account.id, dec!(1.25)).await.unwrap();
    assert_eq!(after_credit.balance, dec!(8.75));

    common::cleanup_accounts(&store, &[account.id]).await;
}

#[tokio::test]
async fn test_account_balance_rejects_sub_cent_values() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let mut params = random::random_account_params(&mut rng, 100);
    params.balance = dec!(10.005);

    let mut conn = store.acquire().await.unwrap();
    let err = conn.create_account(&params).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)), "{:?}", err);

    // Trailing zeros are not extra precision
    params.balance = dec!(10.000);
    let account = conn.create_account(&params).await.unwrap();
    assert_eq!(account.balance, dec!(10));

    let err = conn
        .update_account(&UpdateAccountParams {
            id: account.id,
            balance: dec!(0.001),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)), "{:?}", err);

    let err = conn
        .add_account_balance(account.id, dec!(-0.004))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)), "{:?}", err);

    assert_eq!(conn.get_account(account.id).await.unwrap().balance, dec!(10));

    common::cleanup_accounts(&store, &[account.id]).await;
}

#[tokio::test]
async fn test_missing_account_is_not_found() {
    let store = common::setup_store().await;
    let mut conn = store.acquire().await.unwrap();
    let missing = Uuid::new_v4();

    assert!(conn.get_account(missing).await.unwrap_err().is_not_found());
    assert!(conn
        .update_account(&UpdateAccountParams {
            id: missing,
            balance: Decimal::ONE,
        })
        .await
        .unwrap_err()
        .is_not_found());
    assert!(conn
        .add_account_balance(missing, Decimal::ONE)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(conn.delete_account(missing).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_account() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let account = common::create_random_account(&store, &mut rng).await;

    let mut conn = store.acquire().await.unwrap();
    conn.delete_account(account.id).await.unwrap();

    let err = conn.get_account(account.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "Account", .. }));
}

#[tokio::test]
async fn test_delete_account_with_entries_is_constraint_violation() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let account = common::create_account(&store, &mut rng, dec!(10)).await;

    let mut conn = store.acquire().await.unwrap();
    conn.create_entry(&CreateEntryParams {
        account_id: account.id,
        amount: dec!(1),
    })
    .await
    .unwrap();

    let err = conn.delete_account(account.id).await.unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)), "{:?}", err);

    common::cleanup_accounts(&store, &[account.id]).await;
}

#[tokio::test]
async fn test_list_accounts_second_page() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    // Unique owner keeps other tests' accounts out of the listing
    let owner = random::random_string(&mut rng, 12);
    let mut ids = Vec::new();
    for _ in 0..10 {
        ids.push(common::create_owned_account(&store, &owner, dec!(1)).await.id);
    }

    let mut conn = store.acquire().await.unwrap();
    let first = conn
        .list_accounts(&ListAccountsParams {
            owner: Some(owner.clone()),
            page: Page::new(5, 0),
        })
        .await
        .unwrap();
    let second = conn
        .list_accounts(&ListAccountsParams {
            owner: Some(owner.clone()),
            page: Page::new(5, 5),
        })
        .await
        .unwrap();

    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);

    let first_ids: HashSet<Uuid> = first.iter().map(|a| a.id).collect();
    assert!(second.iter().all(|a| !first_ids.contains(&a.id)));
    assert!(second.iter().all(|a| a.owner == owner));

    common::cleanup_accounts(&store, &ids).await;
}

#[tokio::test]
async fn test_list_rejects_bad_page() {
    let store = common::setup_store().await;
    let mut conn = store.acquire().await.unwrap();

    let err = conn
        .list_accounts(&ListAccountsParams {
            owner: None,
            page: Page::new(0, 0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));

    let err = conn
        .list_entries(&ListEntriesParams {
            account_ids: vec![],
            page: Page::new(5, -1),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

// =========================================================================
// Entries
// =========================================================================

#[tokio::test]
async fn test_create_get_delete_entry() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let account = common::create_account(&store, &mut rng, dec!(50)).await;

    let mut conn = store.acquire().await.unwrap();
    let entry = conn
        .create_entry(&CreateEntryParams {
            account_id: account.id,
            amount: dec!(-12.34),
        })
        .await
        .unwrap();
    assert_eq!(entry.account_id, account.id);
    assert_eq!(entry.amount, dec!(-12.34));

    let fetched = conn.get_entry(entry.id).await.unwrap();
    assert_eq!(fetched.account_id, entry.account_id);
    assert_eq!(fetched.amount, entry.amount);
    assert_within_second(fetched.created_at, entry.created_at);

    conn.delete_entry(entry.id).await.unwrap();
    let err = conn.get_entry(entry.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "Entry", .. }));
    assert!(conn.delete_entry(entry.id).await.unwrap_err().is_not_found());

    common::cleanup_accounts(&store, &[account.id]).await;
}

#[tokio::test]
async fn test_entry_rejects_sub_cent_amount() {
    let store = common::setup_store().await;
    let mut rng = common::rng();
    let account = common::create_account(&store, &mut rng, dec!(0)).await;

    let mut conn = store.acquire().await.unwrap();
    let err = conn
        .create_entry(&CreateEntryParams {
            account_id: account.id,
            amount: dec!(1.004),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)), "{:?}", err);
    assert_eq!(common::entry_count(&store, account.id).await, 0);

    common::cleanup_accounts(&store, &[account.id]).await;
}

#[tokio::test]
async fn test_entry_for_missing_account_is_constraint_violation() {
    let store = common::setup_store().await;
    let mut conn = store.acquire().await.unwrap();

    let err = conn
        .create_entry(&CreateEntryParams {
            account_id: Uuid::new_v4(),
            amount: dec!(1),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)), "{:?}", err);
}

#[tokio::test]
async fn test_list_entries_second_page() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let a = common::create_account(&store, &mut rng, dec!(100)).await;
    let b = common::create_account(&store, &mut rng, dec!(100)).await;

    let mut conn = store.acquire().await.unwrap();
    for i in 0..10 {
        let account_id = if i % 2 == 0 { a.id } else { b.id };
        conn.create_entry(&CreateEntryParams {
            account_id,
            amount: random::random_money(&mut rng, 100),
        })
        .await
        .unwrap();
    }

    let list = |offset| ListEntriesParams {
        account_ids: vec![a.id, b.id],
        page: Page::new(5, offset),
    };
    let first = conn.list_entries(&list(0)).await.unwrap();
    let second = conn.list_entries(&list(5)).await.unwrap();
    let third = conn.list_entries(&list(10)).await.unwrap();

    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert!(third.is_empty());

    let first_ids: HashSet<Uuid> = first.iter().map(|e| e.id).collect();
    assert!(second.iter().all(|e| !first_ids.contains(&e.id)));
    assert!(second
        .iter()
        .all(|e| e.account_id == a.id || e.account_id == b.id));

    common::cleanup_accounts(&store, &[a.id, b.id]).await;
}

// =========================================================================
// Transfers
// =========================================================================

#[tokio::test]
async fn test_create_get_delete_transfer() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let a = common::create_account(&store, &mut rng, dec!(100)).await;
    let b = common::create_account(&store, &mut rng, dec!(100)).await;

    let mut conn = store.acquire().await.unwrap();
    let transfer = conn
        .create_transfer(&CreateTransferParams {
            from_account_id: a.id,
            to_account_id: b.id,
            amount: dec!(7.25),
        })
        .await
        .unwrap();

    let fetched = conn.get_transfer(transfer.id).await.unwrap();
    assert_eq!(fetched.from_account_id, a.id);
    assert_eq!(fetched.to_account_id, b.id);
    assert_eq!(fetched.amount, dec!(7.25));
    assert_within_second(fetched.created_at, transfer.created_at);

    conn.delete_transfer(transfer.id).await.unwrap();
    let err = conn.get_transfer(transfer.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "Transfer", .. }));

    common::cleanup_accounts(&store, &[a.id, b.id]).await;
}

#[tokio::test]
async fn test_transfer_record_rejects_sub_cent_amount() {
    let store = common::setup_store().await;
    let mut rng = common::rng();
    let a = common::create_account(&store, &mut rng, dec!(0)).await;
    let b = common::create_account(&store, &mut rng, dec!(0)).await;

    let mut conn = store.acquire().await.unwrap();
    let err = conn
        .create_transfer(&CreateTransferParams {
            from_account_id: a.id,
            to_account_id: b.id,
            amount: dec!(2.999),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)), "{:?}", err);
    assert_eq!(common::transfer_count(&store, a.id).await, 0);

    common::cleanup_accounts(&store, &[a.id, b.id]).await;
}

#[tokio::test]
async fn test_transfer_amount_check_constraint() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let a = common::create_account(&store, &mut rng, dec!(100)).await;
    let b = common::create_account(&store, &mut rng, dec!(100)).await;

    let mut conn = store.acquire().await.unwrap();
    let err = conn
        .create_transfer(&CreateTransferParams {
            from_account_id: a.id,
            to_account_id: b.id,
            amount: dec!(-1),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)), "{:?}", err);

    common::cleanup_accounts(&store, &[a.id, b.id]).await;
}

#[tokio::test]
async fn test_list_transfers_by_direction() {
    let store = common::setup_store().await;
    let mut rng = common::rng();

    let a = common::create_account(&store, &mut rng, dec!(100)).await;
    let b = common::create_account(&store, &mut rng, dec!(100)).await;
    let c = common::create_account(&store, &mut rng, dec!(100)).await;

    let mut conn = store.acquire().await.unwrap();
    // 6 from a to b, 4 from b to c
    for i in 0..10 {
        let (from, to) = if i < 6 { (a.id, b.id) } else { (b.id, c.id) };
        conn.create_transfer(&CreateTransferParams {
            from_account_id: from,
            to_account_id: to,
            amount: dec!(1),
        })
        .await
        .unwrap();
    }

    // Sent by a or received by c: all 10
    let page = |offset| ListTransfersParams {
        from_account_id: a.id,
        to_account_id: c.id,
        page: Page::new(5, offset),
    };
    let first = conn.list_transfers(&page(0)).await.unwrap();
    let second = conn.list_transfers(&page(5)).await.unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    let first_ids: HashSet<Uuid> = first.iter().map(|t| t.id).collect();
    assert!(second.iter().all(|t| !first_ids.contains(&t.id)));

    let touching_a = conn
        .list_transfers(&ListTransfersParams::touching(a.id, Page::new(100, 0)))
        .await
        .unwrap();
    assert_eq!(touching_a.len(), 6);
    assert!(touching_a.iter().all(|t| t.from_account_id == a.id));

    common::cleanup_accounts(&store, &[a.id, b.id, c.id]).await;
}
