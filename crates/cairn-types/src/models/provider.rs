use crate::models::NetworkModel;
use crate::schema::{default_providers, provider_urls, providers};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A named external data source for one network. The `interface` string
/// identifies the adapter implementation the registry dispatches to.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = providers)]
#[diesel(belongs_to(NetworkModel, foreign_key = network_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProviderModel {
    pub id: i32,
    pub name: String,
    pub network_id: i32,
    pub interface: String,
    pub supports_batching: bool,
    pub batch_block_limit: i32,
    pub operations: Vec<Option<String>>,
    pub default_url: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ProviderModel {
    pub fn supports_operation(&self, operation: &str) -> bool {
        self.operations.iter().flatten().any(|op| op == operation)
    }

    /// batch_block_limit above one is only meaningful with batching support.
    pub fn batch_limit(&self) -> i32 {
        if self.supports_batching {
            self.batch_block_limit
        } else {
            1
        }
    }
}

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = provider_urls)]
#[diesel(belongs_to(ProviderModel, foreign_key = provider_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProviderUrlModel {
    pub id: i32,
    pub provider_id: i32,
    pub address: String,
    pub use_proxy: bool,
}

/// The pinned (network, operation) -> provider mapping. At most one row per
/// pair; mutated only through the administrative write path.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = default_providers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DefaultProviderModel {
    pub id: i32,
    pub network_id: i32,
    pub operation: String,
    pub provider_id: i32,
    pub url_id: Option<i32>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = default_providers)]
pub struct NewDefaultProvider {
    pub network_id: i32,
    pub operation: String,
    pub provider_id: i32,
    pub url_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn provider(supports_batching: bool, batch_block_limit: i32) -> ProviderModel {
        ProviderModel {
            id: 1,
            name: "providerx".to_string(),
            network_id: 1,
            interface: "blockbook".to_string(),
            supports_batching,
            batch_block_limit,
            operations: vec![Some("balance".to_string()), Some("address_txs".to_string())],
            default_url: Some("https://node.example.com".to_string()),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn batch_limit_collapses_without_batching_support() {
        assert_eq!(provider(false, 50).batch_limit(), 1);
        assert_eq!(provider(true, 50).batch_limit(), 50);
    }

    #[test]
    fn supported_operations_are_checked_by_name() {
        let p = provider(true, 10);
        assert!(p.supports_operation("balance"));
        assert!(!p.supports_operation("block_txs"));
    }
}
