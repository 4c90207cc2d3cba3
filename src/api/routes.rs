//! API Routes
//!
//! HTTP endpoint definitions. Handlers parse input, call the store and
//! serialize the result; the ledger rules live in `store`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Currency;
use crate::error::AppError;
use crate::store::{
    Account, CreateAccountParams, Entry, ListAccountsParams, ListEntriesParams,
    ListTransfersParams, Page, Queries, Store, Transfer, TransferParams, TransferResult,
    UpdateAccountParams,
};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub owner: String,
    pub currency: Currency,
    /// Opening balance as a decimal string, defaults to zero
    #[serde(default)]
    pub balance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    /// Amount as a decimal string to keep precision
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct AccountsQuery {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    Page::default().limit
}

impl PageQuery {
    fn page(&self) -> Page {
        Page::new(self.limit, self.offset)
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, AppError> {
    value
        .trim()
        .parse()
        .map_err(|e| AppError::InvalidRequest(format!("Invalid {}: {}", field, e)))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<Store> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/:account_id",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/accounts/:account_id/entries", get(list_account_entries))
        .route("/accounts/:account_id/transfers", get(list_account_transfers))
        .route("/entries/:entry_id", get(get_entry))
        .route("/transfers", axum::routing::post(transfer))
        .route("/transfers/:transfer_id", get(get_transfer))
}

// =========================================================================
// Accounts
// =========================================================================

async fn create_account(
    State(store): State<Store>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let balance = match request.balance.as_deref() {
        Some(raw) => parse_decimal("balance", raw)?,
        None => Decimal::ZERO,
    };
    if balance < Decimal::ZERO {
        return Err(AppError::InvalidRequest(
            "Opening balance cannot be negative".to_string(),
        ));
    }

    let params = CreateAccountParams::new(request.owner, balance, request.currency);
    let account = store.acquire().await?.create_account(&params).await?;

    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(store): State<Store>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Account>, AppError> {
    let account = store.acquire().await?.get_account(account_id).await?;
    Ok(Json(account))
}

async fn list_accounts(
    State(store): State<Store>,
    Query(query): Query<AccountsQuery>,
) -> Result<Json<ListResponse<Account>>, AppError> {
    let params = ListAccountsParams {
        owner: query.owner,
        page: Page::new(query.limit, query.offset),
    };
    let accounts = store.acquire().await?.list_accounts(&params).await?;

    Ok(Json(ListResponse {
        items: accounts,
        limit: params.page.limit,
        offset: params.page.offset,
    }))
}

/// Administrative balance override
async fn update_account(
    State(store): State<Store>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    let balance = parse_decimal("balance", &request.balance)?;
    let account = store
        .acquire()
        .await?
        .update_account(&UpdateAccountParams {
            id: account_id,
            balance,
        })
        .await?;

    tracing::warn!(account_id = %account_id, balance = %balance, "Account balance overridden");

    Ok(Json(account))
}

async fn delete_account(
    State(store): State<Store>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store.acquire().await?.delete_account(account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_account_entries(
    State(store): State<Store>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<Entry>>, AppError> {
    let mut conn = store.acquire().await?;
    // 404 rather than an empty page for unknown accounts
    conn.get_account(account_id).await?;

    let page = query.page();
    let entries = conn
        .list_entries(&ListEntriesParams {
            account_ids: vec![account_id],
            page,
        })
        .await?;

    Ok(Json(ListResponse {
        items: entries,
        limit: page.limit,
        offset: page.offset,
    }))
}

async fn list_account_transfers(
    State(store): State<Store>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<Transfer>>, AppError> {
    let mut conn = store.acquire().await?;
    conn.get_account(account_id).await?;

    let page = query.page();
    let transfers = conn
        .list_transfers(&ListTransfersParams::touching(account_id, page))
        .await?;

    Ok(Json(ListResponse {
        items: transfers,
        limit: page.limit,
        offset: page.offset,
    }))
}

// =========================================================================
// Entries & Transfers
// =========================================================================

async fn get_entry(
    State(store): State<Store>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<Entry>, AppError> {
    let entry = store.acquire().await?.get_entry(entry_id).await?;
    Ok(Json(entry))
}

async fn transfer(
    State(store): State<Store>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResult>), AppError> {
    let params = TransferParams {
        from_account_id: request.from_account_id,
        to_account_id: request.to_account_id,
        amount: parse_decimal("amount", &request.amount)?,
    };

    let result = store.transfer(params).await?;

    Ok((StatusCode::CREATED, Json(result)))
}

async fn get_transfer(
    State(store): State<Store>,
    Path(transfer_id): Path<Uuid>,
) -> Result<Json<Transfer>, AppError> {
    let transfer = store.acquire().await?.get_transfer(transfer_id).await?;
    Ok(Json(transfer))
}
