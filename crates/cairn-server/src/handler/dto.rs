use cairn_types::dto::{AddressTxQuery, TxDirection};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LatestBlockInfoQuery {
    pub network: String,
    /// Exclusive lower bound of the block range.
    pub after: i64,
    /// Inclusive upper bound of the block range.
    pub to: i64,
    pub include_inputs: Option<bool>,
    pub include_info: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct BlockHeadQuery {
    pub network: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct WalletTransactionsQuery {
    pub network: String,
    pub address: String,
    pub currency: Option<String>,
    pub contract_address: Option<String>,
    /// Narrow the result to one transaction, vetted like the full batch.
    pub tx_hash: Option<String>,
    pub direction: Option<TxDirection>,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    /// Skip reconciliation against locally scanned block data.
    pub no_double_check: Option<bool>,
}

impl WalletTransactionsQuery {
    pub fn to_address_tx_query(&self) -> AddressTxQuery {
        AddressTxQuery {
            currency: self.currency.clone(),
            contract_address: self.contract_address.clone(),
            direction: self.direction,
            start_ts: self.start_ts,
            end_ts: self.end_ts,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct WalletBalanceQuery {
    pub network: String,
    /// Comma-separated list of addresses.
    pub addresses: String,
    pub currency: Option<String>,
}

impl WalletBalanceQuery {
    pub fn address_list(&self) -> Vec<String> {
        self.addresses
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PinProviderRequest {
    pub network: String,
    pub operation: String,
    pub provider: String,
    pub url_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_list_splits_and_trims() {
        let query = WalletBalanceQuery {
            network: "btc".to_string(),
            addresses: "a1, a2 ,,a3".to_string(),
            currency: None,
        };
        assert_eq!(query.address_list(), vec!["a1", "a2", "a3"]);
    }
}
