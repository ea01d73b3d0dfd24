//! Order watcher client
//!
//! The watcher decides whether submitted orders are valid and fillable, tracks
//! their lifecycle, and owns the rows of the active order table.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{RelayerError, Result};
use crate::order::{RelayerOrder, SignedOrder, StoredOrder};

/// Submission surface of the order watcher
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderWatcher: Send + Sync {
    /// Hand orders to the watcher; accepted orders appear in the active table
    /// under the hashes returned here
    async fn post_orders(&self, orders: &[SignedOrder]) -> Result<Vec<String>>;
}

/// Receives the rows the watcher accepted when the active table is local
pub trait ActiveOrderSink: Send + Sync {
    fn record_accepted(&self, rows: Vec<StoredOrder>);
}

/// Order the watcher refused, with its reason
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedOrder {
    pub order: SignedOrder,
    #[serde(default)]
    pub reason: String,
}

/// Watcher verdict for one submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatcherResponse {
    #[serde(default)]
    pub accepted: Vec<RelayerOrder>,
    #[serde(default)]
    pub rejected: Vec<RejectedOrder>,
}

impl WatcherResponse {
    /// Hashes of the accepted orders as the watcher reports them
    pub fn accepted_hashes(&self) -> Vec<String> {
        self.accepted
            .iter()
            .map(|order| order.meta_data.order_hash.clone())
            .collect()
    }
}

/// Watcher reached over HTTP
pub struct HttpOrderWatcher {
    client: reqwest::Client,
    endpoint: String,
    sink: Option<Arc<dyn ActiveOrderSink>>,
}

impl HttpOrderWatcher {
    /// Create a watcher client for `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/orders", base_url.trim_end_matches('/')),
            sink: None,
        }
    }

    /// Mirror accepted orders into a local active table
    pub fn with_sink(mut self, sink: Arc<dyn ActiveOrderSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

#[async_trait]
impl OrderWatcher for HttpOrderWatcher {
    async fn post_orders(&self, orders: &[SignedOrder]) -> Result<Vec<String>> {
        debug!(count = orders.len(), endpoint = %self.endpoint, "Posting orders to watcher");

        let response = self
            .client
            .post(&self.endpoint)
            .json(orders)
            .send()
            .await
            .map_err(|e| RelayerError::Watcher(format!("Failed to reach watcher: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayerError::Watcher(format!(
                "Watcher returned {}: {}",
                status, body
            )));
        }

        let verdict = response
            .json::<WatcherResponse>()
            .await
            .map_err(|e| RelayerError::Watcher(format!("Invalid watcher response: {}", e)))?;

        for rejected in &verdict.rejected {
            warn!(
                order_hash = %rejected.order.hash(),
                reason = %rejected.reason,
                "Watcher rejected order"
            );
        }
        info!(
            accepted = verdict.accepted.len(),
            rejected = verdict.rejected.len(),
            "Watcher processed orders"
        );

        if let Some(sink) = &self.sink {
            sink.record_accepted(verdict.accepted.iter().map(StoredOrder::from).collect());
        }

        Ok(verdict.accepted_hashes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;
    use crate::order::OrderState;

    #[test]
    fn test_endpoint_joins_base_url() {
        let watcher = HttpOrderWatcher::new("http://watcher:8008/");
        assert_eq!(watcher.endpoint, "http://watcher:8008/orders");
    }

    #[test]
    fn test_parse_watcher_verdict() {
        let accepted = RelayerOrder::try_from(StoredOrder::from_signed(
            &sample_order("WETH", "DAI"),
            OrderState::Added,
        ))
        .unwrap();
        let raw = serde_json::json!({
            "accepted": [accepted],
            "rejected": [{ "order": sample_order("DAI", "WETH"), "reason": "ORDER_UNFUNDED" }]
        });

        let verdict: WatcherResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(verdict.accepted.len(), 1);
        assert_eq!(verdict.rejected[0].reason, "ORDER_UNFUNDED");

        let row = StoredOrder::from(&verdict.accepted[0]);
        assert_eq!(row.hash, accepted.meta_data.order_hash);
        assert_eq!(verdict.accepted_hashes(), vec![accepted.meta_data.order_hash.clone()]);
        assert_eq!(row.order_state, Some(OrderState::Added));
    }

    #[test]
    fn test_accepted_hashes_follow_watcher_metadata() {
        let mut accepted = RelayerOrder::try_from(StoredOrder::from_signed(
            &sample_order("WETH", "DAI"),
            OrderState::Added,
        ))
        .unwrap();
        accepted.meta_data.order_hash = "0xwatcher1".to_string();
        let verdict = WatcherResponse {
            accepted: vec![accepted],
            rejected: Vec::new(),
        };

        assert_eq!(verdict.accepted_hashes(), vec!["0xwatcher1".to_string()]);
        assert_eq!(StoredOrder::from(&verdict.accepted[0]).hash, "0xwatcher1");
    }

    #[test]
    fn test_empty_verdict_defaults() {
        let verdict: WatcherResponse = serde_json::from_str("{}").unwrap();
        assert!(verdict.accepted.is_empty());
        assert!(verdict.rejected.is_empty());
    }
}
