use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cairn_adapter::{AdapterError, AdapterRegistry, ChainAdapter};
use cairn_types::dto::{
    AddressTxQuery, BlockRangeOutcome, TransferTx, WalletBalance,
};
use cairn_types::{ExplorerError, Operation};
#[cfg(test)]
use mockall::automock;

use crate::selection::ProviderSelector;

/// Everything the services need from upstream explorers, with provider
/// selection and failure translation already applied.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn wallet_balances(
        &self,
        network: &str,
        operation: Operation,
        addresses: Vec<String>,
        currency: &str,
    ) -> Result<Vec<WalletBalance>, ExplorerError>;

    async fn address_transactions(
        &self,
        network: &str,
        operation: Operation,
        address: &str,
        query: &AddressTxQuery,
    ) -> Result<Vec<TransferTx>, ExplorerError>;

    async fn transaction_details(
        &self,
        network: &str,
        operation: Operation,
        hashes: Vec<String>,
        currency: &str,
    ) -> Result<HashMap<String, Vec<TransferTx>>, ExplorerError>;

    async fn block_range(
        &self,
        network: &str,
        after: i64,
        to: i64,
        include_inputs: bool,
        include_info: bool,
    ) -> Result<BlockRangeOutcome, ExplorerError>;

    async fn block_head(&self, network: &str) -> Result<i64, ExplorerError>;
}

/// Gateway backed by the selection cache and the adapter registry.
pub struct DefaultProviderGateway {
    selector: Arc<ProviderSelector>,
    registry: Arc<AdapterRegistry>,
}

impl DefaultProviderGateway {
    pub fn new(selector: Arc<ProviderSelector>, registry: Arc<AdapterRegistry>) -> Self {
        Self { selector, registry }
    }

    async fn resolve(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<(Arc<dyn ChainAdapter>, String), ExplorerError> {
        let selection = self.selector.load(network, operation).await?;
        let adapter = self
            .registry
            .resolve(network, &selection.interface)
            .ok_or_else(|| ExplorerError::AdapterNotRegistered {
                network: network.to_string(),
                interface: selection.interface.clone(),
            })?;
        Ok((adapter, selection.base_url))
    }
}

fn unavailable(network: &str, e: AdapterError) -> ExplorerError {
    ExplorerError::ProviderUnavailable(format!("{}: {}", network, e))
}

#[async_trait]
impl ProviderGateway for DefaultProviderGateway {
    async fn wallet_balances(
        &self,
        network: &str,
        operation: Operation,
        addresses: Vec<String>,
        currency: &str,
    ) -> Result<Vec<WalletBalance>, ExplorerError> {
        let (adapter, base_url) = self.resolve(network, operation).await?;
        adapter
            .fetch_balances(&base_url, &addresses, Some(currency))
            .await
            .map_err(|e| unavailable(network, e))
    }

    async fn address_transactions(
        &self,
        network: &str,
        operation: Operation,
        address: &str,
        query: &AddressTxQuery,
    ) -> Result<Vec<TransferTx>, ExplorerError> {
        let (adapter, base_url) = self.resolve(network, operation).await?;
        match adapter.fetch_address_transactions(&base_url, address, query).await {
            Ok(txs) => Ok(txs),
            Err(AdapterError::NotFound) => Err(ExplorerError::AddressNotFound {
                network: network.to_string(),
                address: address.to_string(),
            }),
            Err(e) => Err(unavailable(network, e)),
        }
    }

    async fn transaction_details(
        &self,
        network: &str,
        operation: Operation,
        hashes: Vec<String>,
        currency: &str,
    ) -> Result<HashMap<String, Vec<TransferTx>>, ExplorerError> {
        let (adapter, base_url) = self.resolve(network, operation).await?;
        adapter
            .fetch_transaction_details(&base_url, &hashes, Some(currency))
            .await
            .map_err(|e| unavailable(network, e))
    }

    async fn block_range(
        &self,
        network: &str,
        after: i64,
        to: i64,
        include_inputs: bool,
        include_info: bool,
    ) -> Result<BlockRangeOutcome, ExplorerError> {
        let (adapter, base_url) = self.resolve(network, Operation::BlockTxs).await?;
        match adapter
            .fetch_block_range(&base_url, after, to, include_inputs, include_info)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(AdapterError::NotFound) => Err(ExplorerError::BlockRangeNotAvailable {
                network: network.to_string(),
                after,
                to,
            }),
            Err(e) => Err(unavailable(network, e)),
        }
    }

    async fn block_head(&self, network: &str) -> Result<i64, ExplorerError> {
        let (adapter, base_url) = self.resolve(network, Operation::BlockHead).await?;
        adapter.fetch_block_head(&base_url).await.map_err(|e| unavailable(network, e))
    }
}
