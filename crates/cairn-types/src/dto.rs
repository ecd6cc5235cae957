use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::operation::Operation;

/// Canonical shape of one transfer leg as seen from an address or a block,
/// regardless of which network or provider produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferTx {
    pub tx_hash: String,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    // utoipa has no BigDecimal schema; documented as its decimal string form.
    #[schema(value_type = String)]
    pub value: BigDecimal,
    pub symbol: String,
    pub confirmations: i64,
    pub block_height: i64,
    pub block_hash: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>)]
    pub tx_fee: Option<BigDecimal>,
    pub memo: Option<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub address: String,
    #[schema(value_type = String)]
    pub balance: BigDecimal,
    pub symbol: String,
    #[schema(value_type = Option<String>)]
    pub unconfirmed_balance: Option<BigDecimal>,
}

/// Cached projection of the pinned (provider, url) pair for one
/// (network, operation). Rebuilt from the database whenever absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSelection {
    pub provider_name: String,
    pub interface: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Local,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlockInfo {
    pub latest_processed_block: i64,
    pub transactions: Vec<TransferTx>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeadInfo {
    pub block_head: i64,
}

/// What a provider adapter returns for a block range query: the addresses
/// touched in the range and the transfers grouped per address.
#[derive(Debug, Clone, Default)]
pub struct BlockRangeOutcome {
    pub addresses: Vec<String>,
    pub transfers: HashMap<String, Vec<TransferTx>>,
    pub latest_block: i64,
}

impl BlockRangeOutcome {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.transfers.is_empty()
    }

    pub fn into_transactions(self) -> Vec<TransferTx> {
        let mut txs: Vec<TransferTx> = self.transfers.into_values().flatten().collect();
        txs.sort_by(|a, b| a.block_height.cmp(&b.block_height).then(a.tx_hash.cmp(&b.tx_hash)));
        txs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TxDirection {
    Incoming,
    Outgoing,
}

/// Filters forwarded to the address-transactions fetch.
#[derive(Debug, Clone, Default)]
pub struct AddressTxQuery {
    pub currency: Option<String>,
    pub contract_address: Option<String>,
    pub direction: Option<TxDirection>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

impl Operation {
    /// The persistence/query operation an address transaction belongs to.
    pub fn for_address_query(is_token: bool) -> Operation {
        if is_token {
            Operation::TokenTxs
        } else {
            Operation::AddressTxs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::FromPrimitive;

    fn transfer(hash: &str, height: i64) -> TransferTx {
        TransferTx {
            tx_hash: hash.to_string(),
            from_address: None,
            to_address: Some("addr".to_string()),
            value: BigDecimal::from_f64(1.5).unwrap(),
            symbol: "BTC".to_string(),
            confirmations: 1,
            block_height: height,
            block_hash: None,
            timestamp: None,
            tx_fee: None,
            memo: None,
            success: true,
        }
    }

    #[test]
    fn block_range_outcome_orders_by_height_then_hash() {
        let mut outcome = BlockRangeOutcome::default();
        outcome.addresses.push("addr".to_string());
        outcome
            .transfers
            .insert("addr".to_string(), vec![transfer("b", 7), transfer("a", 7), transfer("c", 3)]);

        let txs = outcome.into_transactions();
        let order: Vec<_> = txs.iter().map(|t| (t.block_height, t.tx_hash.as_str())).collect();
        assert_eq!(order, vec![(3, "c"), (7, "a"), (7, "b")]);
    }

    #[test]
    fn empty_outcome_is_empty() {
        assert!(BlockRangeOutcome::default().is_empty());
    }

    #[test]
    fn decimal_fields_document_as_strings() {
        let schema = serde_json::to_value(<TransferTx as utoipa::PartialSchema>::schema()).unwrap();
        assert_eq!(schema["properties"]["value"]["type"], "string");
        let schema = serde_json::to_value(<WalletBalance as utoipa::PartialSchema>::schema()).unwrap();
        assert_eq!(schema["properties"]["balance"]["type"], "string");
    }
}
