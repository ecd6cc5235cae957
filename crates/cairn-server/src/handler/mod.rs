pub mod block;
pub mod dto;
pub mod provider;
pub mod wallet;

pub use block::BlockApiModule;
pub use provider::ProviderApiModule;
pub use wallet::WalletApiModule;
