use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use cairn_types::dto::{TransferTx, WalletBalance};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::error::AppError;
use crate::handler::dto::{WalletBalanceQuery, WalletTransactionsQuery};
use crate::{AppState, Pagination};

pub struct WalletApiModule;

impl WalletApiModule {
    pub fn register() -> OpenApiRouter<crate::AppState> {
        OpenApiRouter::new()
            .routes(routes!(get_wallet_transactions_handler))
            .routes(routes!(get_wallet_transactions_from_db_handler))
            .routes(routes!(get_wallet_balance_handler))
    }
}

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "Wallets",
    params(WalletTransactionsQuery),
    responses(
        (status = 200, description = "Reconciled transaction history", body = Vec<TransferTx>),
        (status = 404, description = "Network or address unknown"),
        (status = 502, description = "Upstream explorer failure")
    )
)]
pub async fn get_wallet_transactions_handler(
    Query(query): Query<WalletTransactionsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let txs = state
        .wallets
        .get_wallet_transactions(
            &query.network,
            &query.address,
            &query.to_address_tx_query(),
            query.tx_hash.as_deref(),
            !query.no_double_check.unwrap_or(false),
        )
        .await?;
    Ok(Json(txs))
}

#[utoipa::path(
    get,
    path = "/transactions/db",
    tag = "Wallets",
    params(WalletTransactionsQuery, Pagination),
    responses(
        (status = 200, description = "Transaction history from the local store", body = Vec<TransferTx>),
        (status = 404, description = "Network unknown"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_wallet_transactions_from_db_handler(
    Query(query): Query<WalletTransactionsQuery>,
    pagination: Query<Pagination>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let txs = state
        .wallets
        .get_wallet_transactions_from_db(
            &query.network,
            &query.address,
            &query.to_address_tx_query(),
            pagination.get_limit(),
            pagination.get_offset(),
        )
        .await?;
    Ok(Json(txs))
}

#[utoipa::path(
    get,
    path = "/balance",
    tag = "Wallets",
    params(WalletBalanceQuery),
    responses(
        (status = 200, description = "Balances for the requested addresses", body = Vec<WalletBalance>),
        (status = 404, description = "Network unknown"),
        (status = 502, description = "Upstream explorer failure")
    )
)]
pub async fn get_wallet_balance_handler(
    Query(query): Query<WalletBalanceQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let addresses = query.address_list();
    if addresses.is_empty() {
        return Err(AppError::ValidationError("at least one address is required".to_string()));
    }
    let balances = state
        .wallets
        .get_wallet_balances(&query.network, addresses, query.currency.clone())
        .await?;
    Ok(Json(balances))
}
