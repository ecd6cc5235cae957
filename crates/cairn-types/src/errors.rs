use crate::operation::Operation;

/// Error taxonomy shared by the aggregation core.
///
/// Reconciliation contradictions are intentionally absent: they are findings
/// reported through the alert sink, never surfaced as errors.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    #[error("no data for address {address} on network {network}")]
    AddressNotFound { network: String, address: String },

    #[error("block range ({after}, {to}] is not available on network {network}")]
    BlockRangeNotAvailable { network: String, after: i64, to: i64 },

    #[error("no default provider configured for {operation} on network {network}")]
    NotConfigured { network: String, operation: Operation },

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("no adapter registered for interface {interface} on network {network}")]
    AdapterNotRegistered { network: String, interface: String },

    #[error("could not acquire lock {0}")]
    LockUnavailable(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExplorerError {
    /// True for the variants a caller may treat as "nothing to return".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExplorerError::NetworkNotFound(_)
                | ExplorerError::AddressNotFound { .. }
                | ExplorerError::BlockRangeNotAvailable { .. }
        )
    }
}
