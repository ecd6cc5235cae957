use crate::dto::TransferTx;
use crate::models::NetworkModel;
use crate::operation::Operation;
use crate::schema::transfers;
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A persisted transfer leg, the durable reconciliation baseline.
///
/// Rows are insert-only and deduplicated on
/// (network_id, tx_hash, from_address, to_address, source_operation).
/// Deposit legs carry an empty from-address and a positive value, withdrawal
/// legs an empty to-address and a negative value.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = transfers)]
#[diesel(belongs_to(NetworkModel, foreign_key = network_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransferModel {
    pub id: i64,
    pub network_id: i32,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub value: BigDecimal,
    pub symbol: String,
    pub token: Option<String>,
    pub block_height: i64,
    pub source_operation: String,
    pub created_at: NaiveDateTime,
}

impl TransferModel {
    pub fn into_transfer_tx(self) -> TransferTx {
        TransferTx {
            tx_hash: self.tx_hash,
            from_address: none_if_empty(self.from_address),
            to_address: none_if_empty(self.to_address),
            value: self.value,
            symbol: self.symbol,
            confirmations: 0,
            block_height: self.block_height,
            block_hash: None,
            timestamp: Some(self.created_at),
            tx_fee: None,
            memo: None,
            success: true,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = transfers)]
pub struct NewTransfer {
    pub network_id: i32,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    pub value: BigDecimal,
    pub symbol: String,
    pub token: Option<String>,
    pub block_height: i64,
    pub source_operation: String,
}

impl NewTransfer {
    /// Project an observed address transaction into its persisted row shape.
    pub fn from_tx(
        tx: &TransferTx,
        network_id: i32,
        source_operation: Operation,
        token: Option<String>,
    ) -> Self {
        NewTransfer {
            network_id,
            tx_hash: tx.tx_hash.clone(),
            from_address: tx.from_address.clone().unwrap_or_default(),
            to_address: tx.to_address.clone().unwrap_or_default(),
            value: tx.value.clone(),
            symbol: tx.symbol.clone(),
            token,
            block_height: tx.block_height,
            source_operation: source_operation.as_str().to_string(),
        }
    }
}

fn none_if_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
