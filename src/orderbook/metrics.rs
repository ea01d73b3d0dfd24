//! Prometheus metrics for the order book service

use prometheus::{IntCounter, IntGauge, Registry};

use crate::error::Result;

/// Counters exported on `/metrics`
#[derive(Debug, Clone)]
pub struct RelayerMetrics {
    /// Orders handed to the watcher
    pub orders_submitted: IntCounter,

    /// Orders copied into the persistent table
    pub orders_persisted: IntCounter,

    /// Snapshot messages handed to the publisher
    pub snapshots_published: IntCounter,

    /// Times the expired-order diagnostic fired
    pub expired_order_diagnostics: IntCounter,

    /// Currently connected subscribers
    pub subscribers: IntGauge,
}

impl RelayerMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let metrics = Self {
            orders_submitted: IntCounter::new(
                "relayer_orders_submitted_total",
                "Orders submitted to the order watcher",
            )?,
            orders_persisted: IntCounter::new(
                "relayer_orders_persisted_total",
                "Orders copied into the persistent table",
            )?,
            snapshots_published: IntCounter::new(
                "relayer_book_snapshots_published_total",
                "Order book snapshot messages published",
            )?,
            expired_order_diagnostics: IntCounter::new(
                "relayer_expired_order_diagnostics_total",
                "Expired orders found beyond the maximum expiration buffer",
            )?,
            subscribers: IntGauge::new("relayer_subscribers", "Connected snapshot subscribers")?,
        };

        registry.register(Box::new(metrics.orders_submitted.clone()))?;
        registry.register(Box::new(metrics.orders_persisted.clone()))?;
        registry.register(Box::new(metrics.snapshots_published.clone()))?;
        registry.register(Box::new(metrics.expired_order_diagnostics.clone()))?;
        registry.register(Box::new(metrics.subscribers.clone()))?;

        Ok(metrics)
    }
}
