//! Order book module
//!
//! Builds two-sided books from the active order table, answers filtered
//! order queries and promotes accepted orders into the persistent table.

mod book;
mod freshness;
mod metrics;
mod service;

pub use book::{ask_price, bid_price, build_order_book, compare_asks, compare_bids};
pub use freshness::{
    find_stale_expired, group_by_freshness, group_by_freshness_at, is_fresh, is_fresh_at,
    log_expired_orders, now_secs, Freshness,
};
pub use metrics::RelayerMetrics;
pub use service::{
    AdditionalFilters, OrderBookService, OrderConfig, OrderConfigRequest, OrderFieldFilters,
    OrderPrice,
};

use serde::{Deserialize, Serialize};

use crate::order::RelayerOrder;
use crate::pagination::PaginatedCollection;

/// Bids and asks for one token pair, each paginated independently
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookResponse {
    pub bids: PaginatedCollection<RelayerOrder>,
    pub asks: PaginatedCollection<RelayerOrder>,
}

/// Both orientations of a pool's book, as pushed to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolBookSnapshot {
    pub pool_id: String,
    pub first: OrderbookResponse,
    pub second: OrderbookResponse,
}
