use std::sync::Arc;

use crate::models::{NewTransfer, TransferModel};
use crate::operation::Operation;
use crate::DbPool;
use anyhow::Result;
use bigdecimal::BigDecimal;
use diesel::insert_into;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// Insert transfers, ignoring rows whose dedup tuple already exists.
/// Re-ingestion of an identical tuple is a no-op, never an update.
pub async fn insert_transfers(db: Arc<DbPool>, rows: Vec<NewTransfer>) -> Result<usize> {
    use crate::schema::transfers;

    if rows.is_empty() {
        return Ok(0);
    }
    let mut conn = db.get().await?;
    let inserted = insert_into(transfers::table)
        .values(&rows)
        .on_conflict((
            transfers::network_id,
            transfers::tx_hash,
            transfers::from_address,
            transfers::to_address,
            transfers::source_operation,
        ))
        .do_nothing()
        .execute(&mut conn)
        .await?;

    tracing::info!("Inserted {} of {} transfers", inserted, rows.len());
    Ok(inserted)
}

/// Ground-truth tuples (tx_hash, from, to, value) of block-derived transfers
/// touching one address, for reconciliation.
pub async fn get_address_block_transfer_tuples(
    db: Arc<DbPool>,
    network_id_value: i32,
    address: &str,
) -> Result<Vec<(String, String, String, BigDecimal)>> {
    use crate::schema::transfers::dsl::*;

    let mut conn = db.get().await?;
    let pattern = super::exact_ilike(address);
    let tuples = transfers
        .filter(network_id.eq(network_id_value))
        .filter(source_operation.eq(Operation::BlockTxs.as_str()))
        .filter(from_address.ilike(pattern.clone()).or(to_address.ilike(pattern)))
        .select((tx_hash, from_address, to_address, value))
        .load(&mut conn)
        .await?;
    Ok(tuples)
}

/// Block-derived transfers with height in [after, to], ascending, capped.
pub async fn get_block_transfers_in_range(
    db: Arc<DbPool>,
    network_id_value: i32,
    after_block: i64,
    to_block: i64,
    limit: i64,
) -> Result<Vec<TransferModel>> {
    use crate::schema::transfers::dsl::*;

    let mut conn = db.get().await?;
    let rows = transfers
        .filter(network_id.eq(network_id_value))
        .filter(source_operation.eq(Operation::BlockTxs.as_str()))
        .filter(block_height.ge(after_block))
        .filter(block_height.le(to_block))
        .order(block_height.asc())
        .limit(limit)
        .select(TransferModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(rows)
}

/// Persisted address transactions for one address, newest first.
pub async fn get_address_transfers(
    db: Arc<DbPool>,
    network_id_value: i32,
    address: &str,
    symbol_filter: Option<&str>,
    token_filter: Option<&str>,
    operation: Operation,
    limit: i64,
    offset: i64,
) -> Result<Vec<TransferModel>> {
    use crate::schema::transfers::dsl::*;

    let mut conn = db.get().await?;
    let pattern = super::exact_ilike(address);
    let mut query = transfers
        .filter(network_id.eq(network_id_value))
        .filter(source_operation.eq(operation.as_str()))
        .filter(from_address.ilike(pattern.clone()).or(to_address.ilike(pattern)))
        .into_boxed();

    if let Some(symbol_value) = symbol_filter {
        query = query.filter(symbol.eq(symbol_value.to_uppercase()));
    }
    if let Some(token_value) = token_filter {
        query = query.filter(token.eq(token_value));
    }

    let rows = query
        .order(created_at.desc())
        .limit(limit)
        .offset(offset)
        .select(TransferModel::as_select())
        .load(&mut conn)
        .await?;
    Ok(rows)
}
