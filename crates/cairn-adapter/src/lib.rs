pub mod http;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cairn_types::{AddressTxQuery, BlockRangeOutcome, TransferTx, WalletBalance};

pub use http::HttpClient;

/// Typed failures a protocol adapter may surface. The core never swallows
/// these; they propagate (mapped) to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("not found")]
    NotFound,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("upstream server error (status {0})")]
    UpstreamServer(u16),

    #[error("bad gateway")]
    BadGateway,

    #[error("gateway timeout")]
    GatewayTimeout,

    #[error("request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    #[error("response decode failed: {0}")]
    Decode(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdapterError {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            404 => AdapterError::NotFound,
            429 => AdapterError::RateLimited,
            502 => AdapterError::BadGateway,
            504 => AdapterError::GatewayTimeout,
            code => AdapterError::UpstreamServer(code),
        }
    }
}

/// The one fixed interface every per-network protocol adapter implements.
///
/// Concrete adapters (one per REST/RPC wire shape) live outside this
/// workspace; they are handed a base URL resolved through the provider
/// selection cache on every call.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Identifier matched against `ProviderModel::interface`.
    fn interface(&self) -> &'static str;

    async fn fetch_balances(
        &self,
        base_url: &str,
        addresses: &[String],
        currency: Option<&str>,
    ) -> Result<Vec<WalletBalance>, AdapterError>;

    async fn fetch_address_transactions(
        &self,
        base_url: &str,
        address: &str,
        query: &AddressTxQuery,
    ) -> Result<Vec<TransferTx>, AdapterError>;

    async fn fetch_transaction_details(
        &self,
        base_url: &str,
        hashes: &[String],
        currency: Option<&str>,
    ) -> Result<HashMap<String, Vec<TransferTx>>, AdapterError>;

    async fn fetch_block_range(
        &self,
        base_url: &str,
        after_block: i64,
        to_block: i64,
        include_inputs: bool,
        include_info: bool,
    ) -> Result<BlockRangeOutcome, AdapterError>;

    async fn fetch_block_head(&self, base_url: &str) -> Result<i64, AdapterError>;
}

/// Startup-time map from (network, interface) to the concrete adapter.
/// Resolved once when the process is wired together, never by dynamic name
/// lookup at call time.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<(String, String), Arc<dyn ChainAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, network: &str, adapter: Arc<dyn ChainAdapter>) {
        let key = (network.to_lowercase(), adapter.interface().to_string());
        if self.adapters.insert(key, adapter.clone()).is_some() {
            tracing::warn!(
                "Replaced adapter {} for network {}",
                adapter.interface(),
                network
            );
        }
    }

    pub fn resolve(&self, network: &str, interface: &str) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.get(&(network.to_lowercase(), interface.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubAdapter;

    #[async_trait]
    impl ChainAdapter for StubAdapter {
        fn interface(&self) -> &'static str {
            "blockbook"
        }

        async fn fetch_balances(
            &self,
            _base_url: &str,
            _addresses: &[String],
            _currency: Option<&str>,
        ) -> Result<Vec<WalletBalance>, AdapterError> {
            Ok(vec![])
        }

        async fn fetch_address_transactions(
            &self,
            _base_url: &str,
            _address: &str,
            _query: &AddressTxQuery,
        ) -> Result<Vec<TransferTx>, AdapterError> {
            Ok(vec![])
        }

        async fn fetch_transaction_details(
            &self,
            _base_url: &str,
            _hashes: &[String],
            _currency: Option<&str>,
        ) -> Result<HashMap<String, Vec<TransferTx>>, AdapterError> {
            Ok(HashMap::new())
        }

        async fn fetch_block_range(
            &self,
            _base_url: &str,
            _after_block: i64,
            _to_block: i64,
            _include_inputs: bool,
            _include_info: bool,
        ) -> Result<BlockRangeOutcome, AdapterError> {
            Ok(BlockRangeOutcome::default())
        }

        async fn fetch_block_head(&self, _base_url: &str) -> Result<i64, AdapterError> {
            Ok(0)
        }
    }

    #[test]
    fn registry_resolves_by_network_and_interface() {
        let mut registry = AdapterRegistry::new();
        registry.register("BTC", Arc::new(StubAdapter));

        assert!(registry.resolve("btc", "blockbook").is_some());
        assert!(registry.resolve("BTC", "blockbook").is_some());
        assert!(registry.resolve("btc", "esplora").is_none());
        assert!(registry.resolve("doge", "blockbook").is_none());
    }

    #[test]
    fn status_codes_map_to_typed_errors() {
        use reqwest::StatusCode;

        assert!(matches!(
            AdapterError::from_status(StatusCode::NOT_FOUND),
            AdapterError::NotFound
        ));
        assert!(matches!(
            AdapterError::from_status(StatusCode::TOO_MANY_REQUESTS),
            AdapterError::RateLimited
        ));
        assert!(matches!(
            AdapterError::from_status(StatusCode::BAD_GATEWAY),
            AdapterError::BadGateway
        ));
        assert!(matches!(
            AdapterError::from_status(StatusCode::GATEWAY_TIMEOUT),
            AdapterError::GatewayTimeout
        ));
        assert!(matches!(
            AdapterError::from_status(StatusCode::INTERNAL_SERVER_ERROR),
            AdapterError::UpstreamServer(500)
        ));
    }
}
