//! Common test utilities
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use simple_bank::domain::Currency;
use simple_bank::store::{Account, CreateAccountParams, Queries, Store};
use simple_bank::util::random;
use sqlx::postgres::PgPoolOptions;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,simple_bank=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Connect to the test database and apply migrations.
///
/// Tests share one database, so every test works on accounts it created
/// itself and never assumes the tables are empty.
pub async fn setup_store() -> Store {
    init_tracing();
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    simple_bank::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Store::new(pool)
}

/// Fresh random source for one test
pub fn rng() -> StdRng {
    StdRng::from_entropy()
}

/// Create an account with a random owner and the given balance
pub async fn create_account(store: &Store, rng: &mut StdRng, balance: Decimal) -> Account {
    let params = CreateAccountParams::new(
        random::random_owner(rng),
        balance,
        random::random_currency(rng),
    );
    let mut conn = store.acquire().await.expect("Failed to acquire connection");
    conn.create_account(&params)
        .await
        .expect("Failed to create account")
}

/// Create an account with a random balance
pub async fn create_random_account(store: &Store, rng: &mut StdRng) -> Account {
    let params = random::random_account_params(rng, 100_000);
    let mut conn = store.acquire().await.expect("Failed to acquire connection");
    conn.create_account(&params)
        .await
        .expect("Failed to create account")
}

/// Create an account owned by `owner`
pub async fn create_owned_account(store: &Store, owner: &str, balance: Decimal) -> Account {
    let params = CreateAccountParams::new(owner, balance, Currency::Usd);
    let mut conn = store.acquire().await.expect("Failed to acquire connection");
    conn.create_account(&params)
        .await
        .expect("Failed to create account")
}

pub async fn balance_of(store: &Store, account_id: Uuid) -> Decimal {
    let mut conn = store.acquire().await.expect("Failed to acquire connection");
    conn.get_account(account_id)
        .await
        .expect("Failed to get account")
        .balance
}

/// Number of rows in `table` referencing `account_id`
pub async fn count_rows(store: &Store, sql: &str, account_id: Uuid) -> i64 {
    sqlx::query_scalar(sql)
        .bind(account_id)
        .fetch_one(store.pool())
        .await
        .expect("Failed to count rows")
}

pub async fn transfer_count(store: &Store, account_id: Uuid) -> i64 {
    count_rows(
        store,
        "SELECT COUNT(*) FROM transfers WHERE from_account_id = $1 OR to_account_id = $1",
        account_id,
    )
    .await
}

pub async fn entry_count(store: &Store, account_id: Uuid) -> i64 {
    count_rows(
        store,
        "SELECT COUNT(*) FROM entries WHERE account_id = $1",
        account_id,
    )
    .await
}

/// Remove everything the given accounts own, then the accounts themselves
pub async fn cleanup_accounts(store: &Store, account_ids: &[Uuid]) {
    let mut tx = store.pool().begin().await.expect("Failed to begin cleanup");

    sqlx::query("DELETE FROM entries WHERE account_id = ANY($1)")
        .bind(account_ids)
        .execute(&mut *tx)
        .await
        .expect("Failed to delete entries");
    sqlx::query("DELETE FROM transfers WHERE from_account_id = ANY($1) OR to_account_id = ANY($1)")
        .bind(account_ids)
        .execute(&mut *tx)
        .await
        .expect("Failed to delete transfers");
    sqlx::query("DELETE FROM accounts WHERE id = ANY($1)")
        .bind(account_ids)
        .execute(&mut *tx)
        .await
        .expect("Failed to delete accounts");

    tx.commit().await.expect("Failed to commit cleanup");
}
