use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bigdecimal::BigDecimal;
use cairn_types::dto::TransferTx;
use cairn_types::models::NetworkModel;
use cairn_types::{ExplorerError, Operation};
use serde_json::json;

use crate::alert::AlertSink;
use crate::gateway::ProviderGateway;
use crate::store::{BlockStatsStore, TransferStore, TransferTuple};

/// Cross-checks provider-reported address transactions against locally
/// scanned block data, escalating to per-transaction detail lookups for
/// whatever local data cannot vouch for.
pub struct Reconciler {
    transfers: Arc<dyn TransferStore>,
    stats: Arc<dyn BlockStatsStore>,
    gateway: Arc<dyn ProviderGateway>,
    alerts: Arc<dyn AlertSink>,
}

/// How a candidate batch split against locally scanned block legs.
struct GroundTruthVerdict {
    verified: Vec<TransferTx>,
    unchecked: Vec<TransferTx>,
    contradicted: usize,
}

/// Scale-insensitive comparison key. `1.50` and `1.5` are the same amount.
fn value_key(value: &BigDecimal) -> String {
    value.normalized().to_string()
}

fn tuple_key(hash: &str, from: &str, to: &str, value: &BigDecimal) -> (String, String, String, String) {
    (
        hash.to_lowercase(),
        from.to_lowercase(),
        to.to_lowercase(),
        value_key(value),
    )
}

/// A detail field constrains the candidate only when the provider filled it
/// in. Absent detail fields match anything.
fn field_ok(detail: &Option<String>, candidate: &Option<String>) -> bool {
    match (detail, candidate) {
        (None, _) => true,
        (Some(d), Some(c)) => d.eq_ignore_ascii_case(c),
        (Some(_), None) => false,
    }
}

impl Reconciler {
    pub fn new(
        transfers: Arc<dyn TransferStore>,
        stats: Arc<dyn BlockStatsStore>,
        gateway: Arc<dyn ProviderGateway>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self { transfers, stats, gateway, alerts }
    }

    /// Filter `candidates` down to the transactions we are willing to
    /// surface for `address`.
    ///
    /// The ground-truth pass compares candidates against locally scanned
    /// block legs; any contradiction there taints the whole batch and
    /// disables the detail lookup for it. The detail pass re-fetches
    /// per-transaction details for candidates local data knows nothing
    /// about, restricted to heights the local scan actually covers.
    pub async fn reconcile(
        &self,
        network: &NetworkModel,
        address: &str,
        candidates: Vec<TransferTx>,
        details_operation: Operation,
        currency: &str,
        use_tx_details: bool,
    ) -> Result<Vec<TransferTx>, ExplorerError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let tuples = self.transfers.block_transfer_tuples(network.id, address).await?;
        let verdict = self.ground_truth_check(&network.name, address, candidates, &tuples);

        if verdict.contradicted > 0 {
            // Local data caught the provider lying about at least one
            // transaction; nothing it says about the rest of this batch can
            // be trusted enough to double-check individually. Each casualty
            // of that decision is reported, not silently dropped.
            tracing::warn!(
                "{} contradicted candidates for {} on {}, dropping {} unchecked",
                verdict.contradicted,
                address,
                network.name,
                verdict.unchecked.len()
            );
            for tx in &verdict.unchecked {
                self.alerts.report(
                    "unchecked-transaction",
                    json!({
                        "network": network.name,
                        "address": address,
                        "tx_hash": tx.tx_hash,
                        "value": tx.value.to_string(),
                        "reason": "contradicted-batch",
                    }),
                );
            }
            return Ok(verdict.verified);
        }

        if verdict.unchecked.is_empty() || !use_tx_details {
            let mut out = verdict.verified;
            out.extend(verdict.unchecked);
            return Ok(out);
        }

        let Some(stats) = self.stats.for_network(network.id).await? else {
            // Without scan coverage bounds we cannot tell which heights the
            // detail check is meaningful for.
            tracing::warn!("no block stats for {}, skipping detail check", network.name);
            let mut out = verdict.verified;
            out.extend(verdict.unchecked);
            return Ok(out);
        };

        let mut out = verdict.verified;
        let confirmed = self
            .detail_check(
                network,
                address,
                verdict.unchecked,
                stats.min_available_block,
                details_operation,
                currency,
            )
            .await;
        out.extend(confirmed);
        Ok(out)
    }

    fn ground_truth_check(
        &self,
        network: &str,
        address: &str,
        candidates: Vec<TransferTx>,
        tuples: &[TransferTuple],
    ) -> GroundTruthVerdict {
        let known_hashes: HashSet<String> =
            tuples.iter().map(|(hash, _, _, _)| hash.to_lowercase()).collect();
        let known_legs: HashSet<(String, String, String, String)> = tuples
            .iter()
            .map(|(hash, from, to, value)| tuple_key(hash, from, to, value))
            .collect();
        let mut stored_by_hash: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
        for (hash, from, to, value) in tuples {
            stored_by_hash.entry(hash.to_lowercase()).or_default().push(json!({
                "from": from,
                "to": to,
                "value": value.to_string(),
            }));
        }

        let mut verdict = GroundTruthVerdict {
            verified: Vec::new(),
            unchecked: Vec::new(),
            contradicted: 0,
        };

        for tx in candidates {
            if !known_hashes.contains(&tx.tx_hash.to_lowercase()) {
                verdict.unchecked.push(tx);
                continue;
            }

            let from = tx.from_address.as_deref().unwrap_or("");
            let to = tx.to_address.as_deref().unwrap_or("");
            // Local block scanning stores a withdrawal for `address` as
            // (hash, address, '', value) with the signed (negative) amount
            // and a deposit as (hash, '', to, value); rebuild the leg the
            // candidate claims to be.
            let expected = if from.eq_ignore_ascii_case(address) {
                Some(tuple_key(&tx.tx_hash, from, "", &tx.value))
            } else if to.eq_ignore_ascii_case(address) {
                Some(tuple_key(&tx.tx_hash, "", to, &tx.value))
            } else {
                None
            };

            match expected {
                Some(key) if known_legs.contains(&key) => verdict.verified.push(tx),
                _ => {
                    self.alerts.report(
                        "block-txs-mismatch",
                        json!({
                            "network": network,
                            "address": address,
                            "tx_hash": tx.tx_hash,
                            "from": tx.from_address,
                            "to": tx.to_address,
                            "value": tx.value.to_string(),
                            "stored": stored_by_hash.get(&tx.tx_hash.to_lowercase()),
                        }),
                    );
                    verdict.contradicted += 1;
                }
            }
        }

        verdict
    }

    async fn detail_check(
        &self,
        network: &NetworkModel,
        address: &str,
        unchecked: Vec<TransferTx>,
        min_available_block: i64,
        details_operation: Operation,
        currency: &str,
    ) -> Vec<TransferTx> {
        // Heights the local scan never covered cannot be vouched for either
        // way; leave them out rather than guess.
        let checkable: Vec<TransferTx> = unchecked
            .into_iter()
            .filter(|tx| tx.block_height > min_available_block)
            .collect();
        if checkable.is_empty() {
            return Vec::new();
        }

        let hashes: Vec<String> = checkable.iter().map(|tx| tx.tx_hash.clone()).collect();
        let details = match self
            .gateway
            .transaction_details(&network.name, details_operation, hashes, currency)
            .await
        {
            Ok(details) => details,
            Err(e) => {
                self.alerts.report(
                    "tx-details-fetch-failed",
                    json!({
                        "network": network.name,
                        "address": address,
                        "count": checkable.len(),
                        "error": e.to_string(),
                    }),
                );
                return Vec::new();
            }
        };

        let details: HashMap<String, Vec<TransferTx>> = details
            .into_iter()
            .map(|(hash, legs)| (hash.to_lowercase(), legs))
            .collect();

        let mut confirmed = Vec::new();
        for tx in checkable {
            let Some(legs) = details.get(&tx.tx_hash.to_lowercase()) else {
                self.alerts.report(
                    "unchecked-transaction",
                    json!({
                        "network": network.name,
                        "address": address,
                        "tx_hash": tx.tx_hash,
                    }),
                );
                continue;
            };

            if legs.iter().any(|leg| detail_matches(leg, &tx)) {
                confirmed.push(tx);
            } else {
                self.alerts.report(
                    "tx-details-mismatch",
                    json!({
                        "network": network.name,
                        "address": address,
                        "tx_hash": tx.tx_hash,
                        "value": tx.value.to_string(),
                    }),
                );
            }
        }
        confirmed
    }
}

/// One detail leg vouches for a candidate when every field the detail
/// provider filled in agrees with it. Details report leg amounts unsigned,
/// so a withdrawal candidate also matches its negated amount.
fn detail_matches(leg: &TransferTx, candidate: &TransferTx) -> bool {
    if !field_ok(&leg.from_address, &candidate.from_address)
        || !field_ok(&leg.to_address, &candidate.to_address)
    {
        return false;
    }
    let leg_value = value_key(&leg.value);
    leg_value == value_key(&candidate.value)
        || (candidate.value < BigDecimal::from(0)
            && leg_value == value_key(&-candidate.value.clone()))
}
