pub mod block_stats;
pub mod network;
pub mod provider;
pub mod transfer;

pub use block_stats::BlockStatsModel;
pub use network::NetworkModel;
pub use provider::{DefaultProviderModel, NewDefaultProvider, ProviderModel, ProviderUrlModel};
pub use transfer::{NewTransfer, TransferModel};
