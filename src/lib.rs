//! Relayer order book
//!
//! Stores off-chain signed orders and liquidity offers, answers book, price
//! and order queries, and pushes book snapshots to subscribers whenever new
//! orders are ingested.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod offer;
pub mod offers;
pub mod order;
pub mod orderbook;
pub mod pagination;
pub mod publisher;
pub mod store;
pub mod watcher;

pub use config::Config;
pub use error::{RelayerError, Result};
pub use offers::OfferService;
pub use order::{RelayerOrder, SignedOrder};
pub use orderbook::{OrderBookService, OrderbookResponse, PoolBookSnapshot, RelayerMetrics};
pub use publisher::Publisher;

/// Application state shared across request handlers
pub struct AppState {
    pub orderbook: Arc<OrderBookService>,
    pub offers: Arc<OfferService>,
    pub publisher: Arc<Publisher>,
    pub registry: prometheus::Registry,
    pub config: Arc<Config>,
}
