use crate::schema::networks;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One supported blockchain network and the flags that drive how the core
/// answers queries for it.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = networks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NetworkModel {
    pub id: i32,
    pub name: String,
    /// Range queries are answered from locally stored transfers.
    pub use_db_for_queries: bool,
    /// Observed address transactions are persisted after reconciliation.
    pub save_address_txs: bool,
    /// Address transactions may be double-checked against ground truth.
    pub double_check_txs: bool,
    /// The tx-details pipeline is trusted enough to verify transactions
    /// local block data cannot vouch for.
    pub reliable_tx_details: bool,
    pub block_interval_ms: i64,
    pub range_page_size: i64,
    pub created_at: NaiveDateTime,
}

impl NetworkModel {
    /// A currency is "main" when it is the network's native coin; token
    /// operations apply otherwise.
    pub fn is_main_currency(&self, currency: Option<&str>) -> bool {
        match currency {
            None => true,
            Some(c) => c.eq_ignore_ascii_case(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn network(name: &str) -> NetworkModel {
        NetworkModel {
            id: 1,
            name: name.to_string(),
            use_db_for_queries: true,
            save_address_txs: false,
            double_check_txs: true,
            reliable_tx_details: true,
            block_interval_ms: 600_000,
            range_page_size: 100,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn native_currency_matches_case_insensitively() {
        let net = network("BTC");
        assert!(net.is_main_currency(None));
        assert!(net.is_main_currency(Some("btc")));
        assert!(!net.is_main_currency(Some("USDT")));
    }
}
