use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use cairn_types::{
    repository, BlockStatsModel, DbPool, ExplorerError, NetworkModel, NewTransfer, Operation,
    ProviderSelection, TransferModel,
};
#[cfg(test)]
use mockall::automock;

/// Ground-truth tuple of one stored transfer leg: (tx_hash, from, to, value).
pub type TransferTuple = (String, String, String, BigDecimal);

#[cfg_attr(test, automock)]
#[async_trait]
pub trait NetworkStore: Send + Sync {
    async fn by_name(&self, name: &str) -> Result<Option<NetworkModel>, ExplorerError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlockStatsStore: Send + Sync {
    async fn for_network(&self, network_id: i32)
        -> Result<Option<BlockStatsModel>, ExplorerError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn block_transfer_tuples(
        &self,
        network_id: i32,
        address: &str,
    ) -> Result<Vec<TransferTuple>, ExplorerError>;

    async fn block_transfers_in_range(
        &self,
        network_id: i32,
        after_block: i64,
        to_block: i64,
        limit: i64,
    ) -> Result<Vec<TransferModel>, ExplorerError>;

    async fn insert_ignore(&self, rows: Vec<NewTransfer>) -> Result<usize, ExplorerError>;

    async fn address_transfers(
        &self,
        network_id: i32,
        address: &str,
        symbol: Option<String>,
        token: Option<String>,
        operation: Operation,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransferModel>, ExplorerError>;
}

/// Reads/writes of the pinned provider mapping, the system of record behind
/// the selection cache.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn pinned_selection(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<Option<ProviderSelection>, ExplorerError>;

    /// The transactional administrative write; returns only once the
    /// mapping change is committed.
    async fn pin(
        &self,
        network: &str,
        operation: Operation,
        provider: &str,
        url_id: Option<i32>,
    ) -> Result<(), ExplorerError>;
}

#[derive(Clone)]
pub struct PgNetworkStore {
    db: Arc<DbPool>,
}

impl PgNetworkStore {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NetworkStore for PgNetworkStore {
    async fn by_name(&self, name: &str) -> Result<Option<NetworkModel>, ExplorerError> {
        Ok(repository::get_network_by_name(self.db.clone(), name).await?)
    }
}

#[derive(Clone)]
pub struct PgBlockStatsStore {
    db: Arc<DbPool>,
}

impl PgBlockStatsStore {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlockStatsStore for PgBlockStatsStore {
    async fn for_network(
        &self,
        network_id: i32,
    ) -> Result<Option<BlockStatsModel>, ExplorerError> {
        Ok(repository::get_block_stats(self.db.clone(), network_id).await?)
    }
}

#[derive(Clone)]
pub struct PgTransferStore {
    db: Arc<DbPool>,
}

impl PgTransferStore {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransferStore for PgTransferStore {
    async fn block_transfer_tuples(
        &self,
        network_id: i32,
        address: &str,
    ) -> Result<Vec<TransferTuple>, ExplorerError> {
        Ok(repository::get_address_block_transfer_tuples(self.db.clone(), network_id, address)
            .await?)
    }

    async fn block_transfers_in_range(
        &self,
        network_id: i32,
        after_block: i64,
        to_block: i64,
        limit: i64,
    ) -> Result<Vec<TransferModel>, ExplorerError> {
        Ok(repository::get_block_transfers_in_range(
            self.db.clone(),
            network_id,
            after_block,
            to_block,
            limit,
        )
        .await?)
    }

    async fn insert_ignore(&self, rows: Vec<NewTransfer>) -> Result<usize, ExplorerError> {
        Ok(repository::insert_transfers(self.db.clone(), rows).await?)
    }

    async fn address_transfers(
        &self,
        network_id: i32,
        address: &str,
        symbol: Option<String>,
        token: Option<String>,
        operation: Operation,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransferModel>, ExplorerError> {
        Ok(repository::get_address_transfers(
            self.db.clone(),
            network_id,
            address,
            symbol.as_deref(),
            token.as_deref(),
            operation,
            limit,
            offset,
        )
        .await?)
    }
}

#[derive(Clone)]
pub struct PgMappingStore {
    db: Arc<DbPool>,
}

impl PgMappingStore {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MappingStore for PgMappingStore {
    async fn pinned_selection(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<Option<ProviderSelection>, ExplorerError> {
        let Some(net) = repository::get_network_by_name(self.db.clone(), network).await? else {
            return Ok(None);
        };
        Ok(repository::get_pinned_selection(self.db.clone(), net.id, operation).await?)
    }

    async fn pin(
        &self,
        network: &str,
        operation: Operation,
        provider: &str,
        url_id: Option<i32>,
    ) -> Result<(), ExplorerError> {
        let net = repository::get_network_by_name(self.db.clone(), network)
            .await?
            .ok_or_else(|| ExplorerError::NetworkNotFound(network.to_string()))?;
        let provider_model = repository::get_provider_by_name(self.db.clone(), net.id, provider)
            .await?
            .ok_or_else(|| {
                ExplorerError::Other(anyhow::anyhow!(
                    "provider {provider} not found on network {network}"
                ))
            })?;
        repository::pin_default_provider(
            self.db.clone(),
            net.id,
            operation,
            provider_model.id,
            url_id,
        )
        .await?;
        Ok(())
    }
}
