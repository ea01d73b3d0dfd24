//! HTTP and WebSocket transport

mod error;
mod handlers;
mod ws;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::get_order_book))
        .route("/prices", get(handlers::get_prices))
        .route("/orders", get(handlers::get_orders).post(handlers::post_orders))
        .route("/orders/batch", get(handlers::get_batch_orders))
        .route("/fee_recipients", get(handlers::get_fee_recipients))
        .route("/order_config", post(handlers::post_order_config))
        .route("/order", post(handlers::post_order))
        .route("/order/persistent", post(handlers::post_persistent_order))
        .route("/order/:hash", get(handlers::get_order_by_hash))
        .route("/offer", post(handlers::post_offer))
        .route("/offer/:hash", get(handlers::get_offer_by_hash))
        .route("/offers", get(handlers::get_offers))
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
