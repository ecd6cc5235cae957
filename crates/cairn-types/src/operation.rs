use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The closed set of query kinds a provider can be pinned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Balance,
    TokenBalance,
    TxDetails,
    TokenTxDetails,
    AddressTxs,
    TokenTxs,
    BlockTxs,
    BlockHead,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Balance => "balance",
            Operation::TokenBalance => "token_balance",
            Operation::TxDetails => "tx_details",
            Operation::TokenTxDetails => "token_tx_details",
            Operation::AddressTxs => "address_txs",
            Operation::TokenTxs => "token_txs",
            Operation::BlockTxs => "block_txs",
            Operation::BlockHead => "block_head",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(Operation::Balance),
            "token_balance" => Ok(Operation::TokenBalance),
            "tx_details" => Ok(Operation::TxDetails),
            "token_tx_details" => Ok(Operation::TokenTxDetails),
            "address_txs" => Ok(Operation::AddressTxs),
            "token_txs" => Ok(Operation::TokenTxs),
            "block_txs" => Ok(Operation::BlockTxs),
            "block_head" => Ok(Operation::BlockHead),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}
