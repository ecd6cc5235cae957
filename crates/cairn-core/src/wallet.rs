use std::sync::Arc;

use cairn_types::dto::{AddressTxQuery, TransferTx, WalletBalance};
use cairn_types::models::NewTransfer;
use cairn_types::{ExplorerError, Operation};

use crate::gateway::ProviderGateway;
use crate::reconcile::Reconciler;
use crate::store::{NetworkStore, TransferStore};

/// Address-facing queries: balances and per-address transaction history,
/// reconciled before anything is surfaced.
pub struct WalletService {
    networks: Arc<dyn NetworkStore>,
    transfers: Arc<dyn TransferStore>,
    gateway: Arc<dyn ProviderGateway>,
    reconciler: Arc<Reconciler>,
}

impl WalletService {
    pub fn new(
        networks: Arc<dyn NetworkStore>,
        transfers: Arc<dyn TransferStore>,
        gateway: Arc<dyn ProviderGateway>,
        reconciler: Arc<Reconciler>,
    ) -> Self {
        Self { networks, transfers, gateway, reconciler }
    }

    pub async fn get_wallet_balances(
        &self,
        network: &str,
        addresses: Vec<String>,
        currency: Option<String>,
    ) -> Result<Vec<WalletBalance>, ExplorerError> {
        let net = self
            .networks
            .by_name(network)
            .await?
            .ok_or_else(|| ExplorerError::NetworkNotFound(network.to_string()))?;

        let currency = currency.unwrap_or_else(|| net.name.clone());
        let operation = if net.is_main_currency(Some(&currency)) {
            Operation::Balance
        } else {
            Operation::TokenBalance
        };
        self.gateway.wallet_balances(&net.name, operation, addresses, &currency).await
    }

    /// Fetch, reconcile and (optionally) persist the transaction history of
    /// one address. `tx_hash` narrows the result to a single transaction
    /// after reconciliation, so a filtered query is vetted exactly like an
    /// unfiltered one.
    pub async fn get_wallet_transactions(
        &self,
        network: &str,
        address: &str,
        query: &AddressTxQuery,
        tx_hash: Option<&str>,
        double_check: bool,
    ) -> Result<Vec<TransferTx>, ExplorerError> {
        let net = self
            .networks
            .by_name(network)
            .await?
            .ok_or_else(|| ExplorerError::NetworkNotFound(network.to_string()))?;

        let is_token = query.contract_address.is_some()
            || !net.is_main_currency(query.currency.as_deref());
        let operation = Operation::for_address_query(is_token);
        let currency = query.currency.clone().unwrap_or_else(|| net.name.clone());

        let txs = self
            .gateway
            .address_transactions(&net.name, operation, address, query)
            .await?;
        if txs.is_empty() {
            return Err(ExplorerError::AddressNotFound {
                network: net.name.clone(),
                address: address.to_string(),
            });
        }

        let txs = if double_check && net.double_check_txs {
            let details_operation = if is_token {
                Operation::TokenTxDetails
            } else {
                Operation::TxDetails
            };
            self.reconciler
                .reconcile(
                    &net,
                    address,
                    txs,
                    details_operation,
                    &currency,
                    net.reliable_tx_details,
                )
                .await?
        } else {
            txs
        };

        if net.save_address_txs && !txs.is_empty() {
            let rows: Vec<NewTransfer> = txs
                .iter()
                .map(|tx| {
                    NewTransfer::from_tx(tx, net.id, operation, query.contract_address.clone())
                })
                .collect();
            // Persistence is an optimization for later reconciliations; a
            // failed write must not fail the read.
            if let Err(e) = self.transfers.insert_ignore(rows).await {
                tracing::warn!("failed to persist {} transactions for {}: {}", net.name, address, e);
            }
        }

        Ok(match tx_hash {
            Some(hash) => txs
                .into_iter()
                .filter(|tx| tx.tx_hash.eq_ignore_ascii_case(hash))
                .collect(),
            None => txs,
        })
    }

    /// History straight from the local store, bypassing providers entirely.
    pub async fn get_wallet_transactions_from_db(
        &self,
        network: &str,
        address: &str,
        query: &AddressTxQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransferTx>, ExplorerError> {
        let net = self
            .networks
            .by_name(network)
            .await?
            .ok_or_else(|| ExplorerError::NetworkNotFound(network.to_string()))?;

        let is_token = query.contract_address.is_some()
            || !net.is_main_currency(query.currency.as_deref());
        let rows = self
            .transfers
            .address_transfers(
                net.id,
                address,
                query.currency.clone(),
                query.contract_address.clone(),
                Operation::for_address_query(is_token),
                limit,
                offset,
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.into_transfer_tx()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::MockAlertSink;
    use crate::gateway::MockProviderGateway;
    use crate::store::{MockBlockStatsStore, MockNetworkStore, MockTransferStore};
    use bigdecimal::BigDecimal;
    use cairn_types::models::NetworkModel;
    use chrono::NaiveDateTime;
    use std::str::FromStr;

    fn network(double_check: bool, save: bool) -> NetworkModel {
        NetworkModel {
            id: 5,
            name: "TRX".to_string(),
            use_db_for_queries: true,
            save_address_txs: save,
            double_check_txs: double_check,
            reliable_tx_details: true,
            block_interval_ms: 3_000,
            range_page_size: 100,
            created_at: NaiveDateTime::default(),
        }
    }

    fn tx(hash: &str, value: &str) -> TransferTx {
        TransferTx {
            tx_hash: hash.to_string(),
            from_address: None,
            to_address: Some("addr1".to_string()),
            value: BigDecimal::from_str(value).unwrap(),
            symbol: "TRX".to_string(),
            confirmations: 5,
            block_height: 100,
            block_hash: None,
            timestamp: None,
            tx_fee: None,
            memo: None,
            success: true,
        }
    }

    fn service(
        networks: MockNetworkStore,
        transfers: MockTransferStore,
        gateway: MockProviderGateway,
        reconcile_gateway: MockProviderGateway,
        reconcile_transfers: MockTransferStore,
    ) -> WalletService {
        let mut stats = MockBlockStatsStore::new();
        stats.expect_for_network().returning(|_| Ok(None));
        let mut alerts = MockAlertSink::new();
        alerts.expect_report().return_const(());
        let reconciler = Reconciler::new(
            Arc::new(reconcile_transfers),
            Arc::new(stats),
            Arc::new(reconcile_gateway),
            Arc::new(alerts),
        );
        WalletService::new(
            Arc::new(networks),
            Arc::new(transfers),
            Arc::new(gateway),
            Arc::new(reconciler),
        )
    }

    #[tokio::test]
    async fn main_currency_query_uses_address_txs_and_persists() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(false, true))));
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_address_transactions()
            .withf(|net, op, addr, _| {
                net == "TRX" && *op == Operation::AddressTxs && addr == "addr1"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(vec![tx("aa11", "2"), tx("bb22", "3")]));
        let mut transfers = MockTransferStore::new();
        transfers
            .expect_insert_ignore()
            .withf(|rows| rows.len() == 2 && rows[0].source_operation == "address_txs")
            .times(1)
            .returning(|rows| Ok(rows.len()));

        let out = service(
            networks,
            transfers,
            gateway,
            MockProviderGateway::new(),
            MockTransferStore::new(),
        )
        .get_wallet_transactions(
            "trx",
            "addr1",
            &AddressTxQuery::default(),
            None,
            false,
        )
        .await
        .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn token_query_selects_token_operation() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(false, false))));
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_address_transactions()
            .withf(|_, op, _, _| *op == Operation::TokenTxs)
            .times(1)
            .returning(|_, _, _, _| Ok(vec![tx("aa11", "2")]));

        let query = AddressTxQuery {
            currency: Some("USDT".to_string()),
            ..AddressTxQuery::default()
        };
        let out = service(
            networks,
            MockTransferStore::new(),
            gateway,
            MockProviderGateway::new(),
            MockTransferStore::new(),
        )
        .get_wallet_transactions("trx", "addr1", &query, None, false)
        .await
        .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn empty_history_is_address_not_found() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(false, true))));
        let mut gateway = MockProviderGateway::new();
        gateway.expect_address_transactions().returning(|_, _, _, _| Ok(vec![]));
        let mut transfers = MockTransferStore::new();
        transfers.expect_insert_ignore().times(0);

        let err = service(
            networks,
            transfers,
            gateway,
            MockProviderGateway::new(),
            MockTransferStore::new(),
        )
        .get_wallet_transactions("trx", "addr1", &AddressTxQuery::default(), None, false)
        .await
        .unwrap_err();
        assert!(matches!(err, ExplorerError::AddressNotFound { .. }));
    }

    #[tokio::test]
    async fn double_check_runs_reconciliation_before_returning() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(true, false))));
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_address_transactions()
            .returning(|_, _, _, _| Ok(vec![tx("aa11", "2"), tx("bb22", "9")]));
        let mut reconcile_transfers = MockTransferStore::new();
        // Local data confirms aa11 and contradicts bb22 (scanned value 3).
        reconcile_transfers.expect_block_transfer_tuples().returning(|_, _| {
            Ok(vec![
                (
                    "aa11".to_string(),
                    String::new(),
                    "addr1".to_string(),
                    BigDecimal::from_str("2").unwrap(),
                ),
                (
                    "bb22".to_string(),
                    String::new(),
                    "addr1".to_string(),
                    BigDecimal::from_str("3").unwrap(),
                ),
            ])
        });

        let out = service(
            networks,
            MockTransferStore::new(),
            gateway,
            MockProviderGateway::new(),
            reconcile_transfers,
        )
        .get_wallet_transactions("trx", "addr1", &AddressTxQuery::default(), None, true)
        .await
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tx_hash, "aa11");
    }

    #[tokio::test]
    async fn tx_hash_filter_applies_after_fetch() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(false, false))));
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_address_transactions()
            .returning(|_, _, _, _| Ok(vec![tx("aa11", "2"), tx("bb22", "3")]));

        let out = service(
            networks,
            MockTransferStore::new(),
            gateway,
            MockProviderGateway::new(),
            MockTransferStore::new(),
        )
        .get_wallet_transactions(
            "trx",
            "addr1",
            &AddressTxQuery::default(),
            Some("BB22"),
            false,
        )
        .await
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tx_hash, "bb22");
    }

    #[tokio::test]
    async fn balances_pass_through_for_main_currency() {
        let mut networks = MockNetworkStore::new();
        networks.expect_by_name().returning(|_| Ok(Some(network(false, false))));
        let mut gateway = MockProviderGateway::new();
        gateway
            .expect_wallet_balances()
            .withf(|_, op, addrs, currency| {
                *op == Operation::Balance && addrs.len() == 1 && currency == "TRX"
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(vec![WalletBalance {
                    address: "addr1".to_string(),
                    balance: BigDecimal::from_str("12").unwrap(),
                    symbol: "TRX".to_string(),
                    unconfirmed_balance: None,
                }])
            });

        let out = service(
            networks,
            MockTransferStore::new(),
            gateway,
            MockProviderGateway::new(),
            MockTransferStore::new(),
        )
        .get_wallet_balances("trx", vec!["addr1".to_string()], None)
        .await
        .unwrap();
        assert_eq!(out.len(), 1);
    }
}
