//! Configuration module for the relayer order book

use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

/// Page returned when the caller does not ask for one
pub const DEFAULT_PAGE: usize = 1;

/// Page size used for book snapshots and unspecified requests
pub const DEFAULT_PER_PAGE: usize = 1000;

/// Address value legacy clients send to mean "no filter"
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Header carrying the caller's API key
pub const API_KEY_HEADER: &str = "0x-api-key";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port for the HTTP and WebSocket listener
    pub http_port: u16,

    /// Base URL of the order watcher service
    pub order_watcher_url: String,

    /// Base URL of the pool registry lookup service
    pub pool_registry_url: String,

    /// Orders expiring within this many seconds are treated as stale
    pub order_expiration_buffer_secs: u64,

    /// Expired orders beyond this horizon should already have been purged by the watcher
    pub max_order_expiration_buffer_secs: u64,

    /// API keys allowed to post persistent orders
    pub persistent_order_api_keys: Vec<String>,

    /// Rows per write when copying orders into the persistent table
    pub orders_update_chunk_size: usize,

    /// Pending notifications buffered per subscriber before messages are dropped
    pub subscriber_queue_capacity: usize,

    /// Address the relayer requires as fee recipient on submitted orders
    pub fee_recipient: String,

    /// Taker token fee the relayer requires on submitted orders
    pub taker_token_fee_amount: Decimal,
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let persistent_order_api_keys: Vec<String> =
            env::var("SRA_PERSISTENT_ORDER_POSTING_WHITELISTED_API_KEYS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

        Ok(Self {
            http_port: parse_var("HTTP_PORT", defaults.http_port),
            order_watcher_url: env::var("ORDER_WATCHER_URL")
                .unwrap_or(defaults.order_watcher_url),
            pool_registry_url: env::var("POOL_REGISTRY_URL")
                .unwrap_or(defaults.pool_registry_url),
            order_expiration_buffer_secs: parse_var(
                "SRA_ORDER_EXPIRATION_BUFFER_SECONDS",
                defaults.order_expiration_buffer_secs,
            ),
            max_order_expiration_buffer_secs: parse_var(
                "MAX_ORDER_EXPIRATION_BUFFER_SECONDS",
                defaults.max_order_expiration_buffer_secs,
            ),
            persistent_order_api_keys,
            orders_update_chunk_size: parse_var(
                "DB_ORDERS_UPDATE_CHUNK_SIZE",
                defaults.orders_update_chunk_size,
            )
            .max(1),
            subscriber_queue_capacity: parse_var(
                "SUBSCRIBER_QUEUE_CAPACITY",
                defaults.subscriber_queue_capacity,
            )
            .max(1),
            fee_recipient: env::var("FEE_RECIPIENT_ADDRESS")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or(defaults.fee_recipient),
            taker_token_fee_amount: parse_var(
                "TAKER_FEE_UNIT_AMOUNT",
                defaults.taker_token_fee_amount,
            ),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            order_watcher_url: "http://127.0.0.1:8008".to_string(),
            pool_registry_url: "http://127.0.0.1:8009".to_string(),
            order_expiration_buffer_secs: 10,
            max_order_expiration_buffer_secs: 180,
            persistent_order_api_keys: Vec::new(),
            orders_update_chunk_size: 300,
            subscriber_queue_capacity: 64,
            fee_recipient: NULL_ADDRESS.to_string(),
            taker_token_fee_amount: Decimal::ZERO,
        }
    }
}
