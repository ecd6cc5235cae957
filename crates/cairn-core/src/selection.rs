use std::sync::Arc;
use std::time::Duration;

use cairn_types::{ExplorerError, Operation, ProviderSelection};

use crate::cache::{CacheStore, LockStore};
use crate::store::MappingStore;

/// Default bound on how long a rebuild waits for the key-scoped lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves "which provider+URL serves operation O for network N right now".
///
/// Selections are cached without expiry and rebuilt from the system of
/// record under a key-scoped distributed lock, so exactly one worker
/// rebuilds a pair at a time and no partially-built selection is ever
/// observable.
pub struct ProviderSelector {
    cache: Arc<dyn CacheStore>,
    lock: Arc<dyn LockStore>,
    store: Arc<dyn MappingStore>,
    lock_timeout: Duration,
}

fn cache_key(network: &str, operation: Operation) -> String {
    format!("selection:{}:{}", network.to_lowercase(), operation)
}

fn lock_key(network: &str, operation: Operation) -> String {
    format!("lock:selection:{}:{}", network.to_lowercase(), operation)
}

impl ProviderSelector {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        lock: Arc<dyn LockStore>,
        store: Arc<dyn MappingStore>,
        lock_timeout: Duration,
    ) -> Self {
        Self { cache, lock, store, lock_timeout }
    }

    /// Resolve the selection for (network, operation), rebuilding on miss.
    pub async fn load(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<ProviderSelection, ExplorerError> {
        if let Some(selection) = self.cached(network, operation).await? {
            return Ok(selection);
        }

        match self.coupled_rebuild(network, operation).await {
            Ok(Some(selection)) => Ok(selection),
            Ok(None) => Err(ExplorerError::NotConfigured {
                network: network.to_string(),
                operation,
            }),
            Err(ExplorerError::LockUnavailable(key)) => {
                // Another worker may have finished the rebuild while we
                // were waiting; a stale-but-present value is acceptable.
                match self.cached(network, operation).await? {
                    Some(selection) => Ok(selection),
                    None => Err(ExplorerError::LockUnavailable(key)),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Re-project the committed mapping into the cache. Called after an
    /// administrative write commits, never as part of it.
    pub async fn invalidate_and_rebuild(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<(), ExplorerError> {
        match self.coupled_rebuild(network, operation).await? {
            Some(_) => Ok(()),
            None => Err(ExplorerError::NotConfigured {
                network: network.to_string(),
                operation,
            }),
        }
    }

    /// Every rebuild of `block_txs` first attempts a `block_head` rebuild
    /// for the same network as an independent, separately-locked step; its
    /// failure does not abort this one.
    async fn coupled_rebuild(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<Option<ProviderSelection>, ExplorerError> {
        if operation == Operation::BlockTxs {
            if let Err(e) = self.rebuild_pair(network, Operation::BlockHead).await {
                tracing::warn!(
                    "block_head rebuild for {} failed, continuing with block_txs: {}",
                    network,
                    e
                );
            }
        }
        self.rebuild_pair(network, operation).await
    }

    /// The administrative write path: persist the pin, then — only once the
    /// commit has returned — refresh the cache. A rebuild failure never
    /// unwinds the committed change; the next miss self-heals.
    pub async fn pin_default_provider(
        &self,
        network: &str,
        operation: Operation,
        provider: &str,
        url_id: Option<i32>,
    ) -> Result<(), ExplorerError> {
        self.store.pin(network, operation, provider, url_id).await?;

        if let Err(e) = self.invalidate_and_rebuild(network, operation).await {
            tracing::warn!(
                "selection rebuild after pinning {} for {}:{} failed: {}",
                provider,
                network,
                operation,
                e
            );
        }
        Ok(())
    }

    async fn cached(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<Option<ProviderSelection>, ExplorerError> {
        let Some(raw) = self.cache.get(&cache_key(network, operation)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(selection) => Ok(Some(selection)),
            Err(e) => {
                tracing::warn!(
                    "discarding undecodable cached selection for {}:{}: {}",
                    network,
                    operation,
                    e
                );
                Ok(None)
            }
        }
    }

    /// One locked rebuild of a single (network, operation) pair. The lock is
    /// released on every exit path; the cache is written once, at the end of
    /// a successful store read.
    async fn rebuild_pair(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<Option<ProviderSelection>, ExplorerError> {
        let lock_key = lock_key(network, operation);
        if !self.lock.acquire(&lock_key, self.lock_timeout).await? {
            return Err(ExplorerError::LockUnavailable(lock_key));
        }

        let result = self.rebuild_locked(network, operation).await;

        if let Err(e) = self.lock.release(&lock_key).await {
            tracing::warn!("failed to release {}: {}", lock_key, e);
        }
        result
    }

    async fn rebuild_locked(
        &self,
        network: &str,
        operation: Operation,
    ) -> Result<Option<ProviderSelection>, ExplorerError> {
        let key = cache_key(network, operation);
        match self.store.pinned_selection(network, operation).await? {
            Some(selection) => {
                let raw = serde_json::to_string(&selection)
                    .map_err(|e| ExplorerError::Other(e.into()))?;
                self.cache.set(&key, &raw, None).await?;
                tracing::info!(
                    "rebuilt selection {}:{} -> {} via {}",
                    network,
                    operation,
                    selection.provider_name,
                    selection.base_url
                );
                Ok(Some(selection))
            }
            None => {
                // No active mapping: drop any stale projection.
                self.cache.del(&key).await?;
                Ok(None)
            }
        }
    }
}
