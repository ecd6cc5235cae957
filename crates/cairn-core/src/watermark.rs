use std::sync::Arc;

use cairn_types::dto::{LatestBlockInfo, Provenance};
use cairn_types::{ExplorerError, BLOCK_RANGE_ROW_CAP, UNCONFIRMED_BLOCK_HEIGHT};

use crate::gateway::ProviderGateway;
use crate::store::{BlockStatsStore, NetworkStore, TransferStore};

/// Serves "what happened between block `after` and block `to`" from the
/// local scan store when the network is configured for it, falling back to
/// the upstream provider otherwise.
pub struct BlockInfoService {
    networks: Arc<dyn NetworkStore>,
    stats: Arc<dyn BlockStatsStore>,
    transfers: Arc<dyn TransferStore>,
    gateway: Arc<dyn ProviderGateway>,
}

/// The height callers may safely treat as fully served by this response.
///
/// `last_tx_height` is the height of the newest returned row; an
/// unconfirmed row pins the watermark to the requested ceiling, and an
/// empty result falls back to how far the scanner has processed. The
/// result never runs ahead of `to`.
fn resolve_watermark(stats_latest: i64, last_tx_height: Option<i64>, to: i64) -> i64 {
    let tx_height = match last_tx_height {
        Some(UNCONFIRMED_BLOCK_HEIGHT) => to,
        Some(height) => height,
        None => stats_latest,
    };
    stats_latest.max(tx_height).min(to)
}

impl BlockInfoService {
    pub fn new(
        networks: Arc<dyn NetworkStore>,
        stats: Arc<dyn BlockStatsStore>,
        transfers: Arc<dyn TransferStore>,
        gateway: Arc<dyn ProviderGateway>,
    ) -> Self {
        Self { networks, stats, transfers, gateway }
    }

    pub async fn latest_block_info(
        &self,
        network: &str,
        after: i64,
        to: i64,
        include_inputs: bool,
        include_info: bool,
    ) -> Result<LatestBlockInfo, ExplorerError> {
        let net = self
            .networks
            .by_name(network)
            .await?
            .ok_or_else(|| ExplorerError::NetworkNotFound(network.to_string()))?;

        if !net.use_db_for_queries {
            return self.from_provider(&net.name, after, to, include_inputs, include_info).await;
        }

        let stats = self.stats.for_network(net.id).await?.ok_or_else(|| {
            ExplorerError::BlockRangeNotAvailable { network: net.name.clone(), after, to }
        })?;
        // Rows older than the scan's retention floor were pruned; serving a
        // range that starts before it would silently miss transactions.
        if after < stats.min_available_block - 1 {
            return Err(ExplorerError::BlockRangeNotAvailable {
                network: net.name.clone(),
                after,
                to,
            });
        }

        let rows = self
            .transfers
            .block_transfers_in_range(net.id, after + 1, to, BLOCK_RANGE_ROW_CAP)
            .await?;
        if rows.len() as i64 >= BLOCK_RANGE_ROW_CAP {
            tracing::warn!(
                "block range {}..={} on {} truncated at {} rows",
                after + 1,
                to,
                net.name,
                BLOCK_RANGE_ROW_CAP
            );
        }

        let last_tx_height = rows.last().map(|row| row.block_height);
        let latest_processed_block =
            resolve_watermark(stats.latest_processed_block, last_tx_height, to);
        let transactions = rows.into_iter().map(|row| row.into_transfer_tx()).collect();

        Ok(LatestBlockInfo {
            latest_processed_block,
            transactions,
            provenance: Provenance::Local,
        })
    }

    pub async fn block_head(&self, network: &str) -> Result<i64, ExplorerError> {
        let net = self
            .networks
            .by_name(network)
            .await?
            .ok_or_else(|| ExplorerError::NetworkNotFound(network.to_string()))?;
        self.gateway.block_head(&net.name).await
    }

    async fn from_provider(
        &self,
        network: &str,
        after: i64,
        to: i64,
        include_inputs: bool,
        include_info: bool,
    ) -> Result<LatestBlockInfo, ExplorerError> {
        let outcome = self
            .gateway
            .block_range(network, after, to, include_inputs, include_info)
            .await?;
        if outcome.is_empty() {
            return Err(ExplorerError::BlockRangeNotAvailable {
                network: network.to_string(),
                after,
                to,
            });
        }

        Ok(LatestBlockInfo {
            latest_processed_block: outcome.latest_block.min(to),
            transactions: outcome.into_transactions(),
            provenance: Provenance::External,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockProviderGateway;
    use crate::store::{MockBlockStatsStore, MockNetworkStore, MockTransferStore};
    use bigdecimal::BigDecimal;
    use cairn_types::dto::{BlockRangeOutcome, TransferTx};
    use cairn_types::models::{BlockStatsModel, NetworkModel, TransferModel};
    use chrono::NaiveDateTime;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn network(use_db: bool) -> NetworkModel {
        NetworkModel {
            id: 3,
            name: "ETH".to_string(),
            use_db_for_queries: use_db,
            save_address_txs: true,
            double_check_txs: true,
            reliable_tx_details: true,
            block_interval_ms: 12_000,
            range_page_size: 100,
            created_at: NaiveDateTime::default(),
        }
    }

    fn stats(latest_processed: i64, min_available: i64) -> BlockStatsModel {
        BlockStatsModel {
            network_id: 3,
            latest_processed_block: latest_processed,
            latest_fetched_block: latest_processed,
            min_available_block: min_available,
            latest_rechecked_block: 0,
            updated_at: NaiveDateTime::default(),
        }
    }

    fn row(height: i64) -> TransferModel {
        TransferModel {
            id: height,
            network_id: 3,
            tx_hash: format!("hash{}", height),
            from_address: String::new(),
            to_address: "addr1".to_string(),
            value: BigDecimal::from_str("1").unwrap(),
            symbol: "ETH".to_string(),
            token: None,
            block_height: height,
            source_operation: "block_txs".to_string(),
            created_at: NaiveDateTime::default(),
        }
    }

    fn service(
        networks: MockNetworkStore,
        stat_store: MockBlockStatsStore,
        transfers: MockTransferStore,
        gateway: MockProviderGateway,
    ) -> BlockInfoService {
        BlockInfoService::new(
            Arc::new(networks),
            Arc::new(stat_store),
            Arc::new(transfers),
            Arc::new(gateway),
        )
    }

    #[rstest]
    // Rows ahead of the scanner: the rows win.
    #[case(100, Some(120), 150, 120)]
    // Scanner ahead of the rows: the scanner wins.
    #[case(130, Some(120), 150, 130)]
    // Never past the requested ceiling.
    #[case(200, Some(180), 150, 150)]
    // Unconfirmed tail pins to the ceiling.
    #[case(100, Some(UNCONFIRMED_BLOCK_HEIGHT), 150, 150)]
    // Nothing in range: scanner progress, clamped.
    #[case(100, None, 150, 100)]
    #[case(200, None, 150, 150)]
    fn watermark_is_clamped_between_rows_stats_and_ceiling(
        #[case] stats_latest: i64,
        #[case] last_tx_height: Option<i64>,
        #[case] to: i64,
        #[case] expected: i64,
    ) {
        assert_eq!(resolve_watermark(stats_latest, last_tx_height, to), expected);
    }

    #[tokio::test]
    async fn local_path_serves_rows_and_watermark() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(true))));
        let mut stat_store = MockBlockStatsStore::new();
        stat_store.expect_for_network().returning(|_| Ok(Some(stats(110, 10))));
        let mut transfers = MockTransferStore::new();
        transfers
            .expect_block_transfers_in_range()
            .withf(|_, from, to, cap| {
                *from == 101 && *to == 150 && *cap == BLOCK_RANGE_ROW_CAP
            })
            .returning(|_, _, _, _| Ok(vec![row(105), row(120)]));
        let mut gateway = MockProviderGateway::new();
        gateway.expect_block_range().times(0);

        let info = service(networks, stat_store, transfers, gateway)
            .latest_block_info("ETH", 100, 150, false, false)
            .await
            .unwrap();
        assert_eq!(info.latest_processed_block, 120);
        assert_eq!(info.transactions.len(), 2);
        assert_eq!(info.provenance, Provenance::Local);
    }

    #[tokio::test]
    async fn empty_range_reports_scanner_progress_with_no_transactions() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(true))));
        let mut stat_store = MockBlockStatsStore::new();
        stat_store.expect_for_network().returning(|_| Ok(Some(stats(55, 10))));
        let mut transfers = MockTransferStore::new();
        transfers.expect_block_transfers_in_range().returning(|_, _, _, _| Ok(vec![]));
        let gateway = MockProviderGateway::new();

        let info = service(networks, stat_store, transfers, gateway)
            .latest_block_info("ETH", 50, 60, false, false)
            .await
            .unwrap();
        assert_eq!(info.latest_processed_block, 55);
        assert!(info.transactions.is_empty());
    }

    #[tokio::test]
    async fn range_before_retention_floor_is_unavailable() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(true))));
        let mut stat_store = MockBlockStatsStore::new();
        stat_store.expect_for_network().returning(|_| Ok(Some(stats(110, 50))));
        let transfers = MockTransferStore::new();
        let gateway = MockProviderGateway::new();

        let err = service(networks, stat_store, transfers, gateway)
            .latest_block_info("ETH", 40, 150, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::BlockRangeNotAvailable { .. }));
    }

    #[tokio::test]
    async fn missing_stats_is_unavailable() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(true))));
        let mut stat_store = MockBlockStatsStore::new();
        stat_store.expect_for_network().returning(|_| Ok(None));
        let transfers = MockTransferStore::new();
        let gateway = MockProviderGateway::new();

        let err = service(networks, stat_store, transfers, gateway)
            .latest_block_info("ETH", 100, 150, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::BlockRangeNotAvailable { .. }));
    }

    #[tokio::test]
    async fn provider_path_clamps_watermark_and_converts_transfers() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(false))));
        let stat_store = MockBlockStatsStore::new();
        let transfers = MockTransferStore::new();
        let mut gateway = MockProviderGateway::new();
        gateway.expect_block_range().times(1).returning(|_, _, _, _, _| {
            let mut by_address: HashMap<String, Vec<TransferTx>> = HashMap::new();
            by_address.insert(
                "addr1".to_string(),
                vec![TransferTx {
                    tx_hash: "hash1".to_string(),
                    from_address: None,
                    to_address: Some("addr1".to_string()),
                    value: BigDecimal::from_str("1").unwrap(),
                    symbol: "ETH".to_string(),
                    confirmations: 2,
                    block_height: 120,
                    block_hash: None,
                    timestamp: None,
                    tx_fee: None,
                    memo: None,
                    success: true,
                }],
            );
            Ok(BlockRangeOutcome {
                addresses: vec!["addr1".to_string()],
                transfers: by_address,
                latest_block: 999,
            })
        });

        let info = service(networks, stat_store, transfers, gateway)
            .latest_block_info("ETH", 100, 150, true, true)
            .await
            .unwrap();
        assert_eq!(info.latest_processed_block, 150);
        assert_eq!(info.transactions.len(), 1);
        assert_eq!(info.provenance, Provenance::External);
    }

    #[tokio::test]
    async fn empty_provider_outcome_is_unavailable() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(false))));
        let stat_store = MockBlockStatsStore::new();
        let transfers = MockTransferStore::new();
        let mut gateway = MockProviderGateway::new();
        gateway.expect_block_range().returning(|_, _, _, _, _| {
            Ok(BlockRangeOutcome {
                addresses: vec![],
                transfers: HashMap::new(),
                latest_block: 0,
            })
        });

        let err = service(networks, stat_store, transfers, gateway)
            .latest_block_info("ETH", 100, 150, false, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::BlockRangeNotAvailable { .. }));
    }

    #[tokio::test]
    async fn unknown_network_is_not_found() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(None));
        let stat_store = MockBlockStatsStore::new();
        let transfers = MockTransferStore::new();
        let gateway = MockProviderGateway::new();

        let err = service(networks, stat_store, transfers, gateway)
            .block_head("NOPE")
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::NetworkNotFound(_)));
    }
}
