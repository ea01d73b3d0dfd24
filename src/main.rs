//! Relayer order book service
//!
//! Serves the order book HTTP API and the snapshot WebSocket, submitting new
//! orders to the order watcher and resolving pool attributes through the
//! pool registry.

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relayer_orderbook::api::create_router;
use relayer_orderbook::offer::{AddLiquidityOffer, CreatePoolOffer, RemoveLiquidityOffer};
use relayer_orderbook::offers::HttpPoolRegistry;
use relayer_orderbook::store::{MemoryOfferRepository, MemoryOrderStore};
use relayer_orderbook::watcher::HttpOrderWatcher;
use relayer_orderbook::{
    AppState, Config, OfferService, OrderBookService, Publisher, RelayerMetrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting relayer order book");

    let config = Arc::new(Config::load()?);
    info!(
        http_port = config.http_port,
        order_watcher_url = %config.order_watcher_url,
        pool_registry_url = %config.pool_registry_url,
        "Configuration loaded"
    );

    let registry = prometheus::Registry::new();
    let metrics = Arc::new(RelayerMetrics::new(&registry)?);

    let publisher = Arc::new(
        Publisher::new(config.subscriber_queue_capacity)
            .with_subscriber_gauge(metrics.subscribers.clone()),
    );

    let order_store = Arc::new(MemoryOrderStore::new());
    let watcher =
        Arc::new(HttpOrderWatcher::new(&config.order_watcher_url).with_sink(order_store.clone()));

    let orderbook = Arc::new(OrderBookService::new(
        order_store,
        watcher,
        publisher.clone(),
        config.clone(),
        metrics,
    ));

    let offers = Arc::new(OfferService::new(
        Arc::new(MemoryOfferRepository::<CreatePoolOffer>::new()),
        Arc::new(MemoryOfferRepository::<AddLiquidityOffer>::new()),
        Arc::new(MemoryOfferRepository::<RemoveLiquidityOffer>::new()),
        Arc::new(HttpPoolRegistry::new(&config.pool_registry_url)),
    ));

    let state = Arc::new(AppState {
        orderbook,
        offers,
        publisher,
        registry,
        config: config.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
