pub mod block_stats;
pub mod network;
pub mod provider;
pub mod transfer;

pub use block_stats::get_block_stats;
pub use network::get_network_by_name;
pub use provider::{get_pinned_selection, get_provider_by_name, pin_default_provider};
pub use transfer::{
    get_address_block_transfer_tuples, get_address_transfers, get_block_transfers_in_range,
    insert_transfers,
};

/// Escape ILIKE metacharacters so a caller-supplied value matches only
/// itself, case-insensitively.
pub(crate) fn exact_ilike(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
