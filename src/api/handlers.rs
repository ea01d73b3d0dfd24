//! Request handlers
//!
//! Handlers only translate between HTTP and the services; every rule lives in
//! `OrderBookService` and `OfferService`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{API_KEY_HEADER, DEFAULT_PAGE, DEFAULT_PER_PAGE};
use crate::error::{RelayerError, Result};
use crate::offer::{OfferKind, SubmittedOffer};
use crate::offers::OfferFilter;
use crate::order::SignedOrder;
use crate::orderbook::{AdditionalFilters, OrderConfig, OrderConfigRequest, OrderFieldFilters};
use crate::pagination::PaginatedCollection;
use crate::AppState;

/// Query keys of `GET /orders` that are not column filters
const PAGE: &str = "page";
const PER_PAGE: &str = "perPage";
const IS_UNFILLABLE: &str = "isUnfillable";
const TRADER: &str = "trader";

fn page_or_default(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Split comma separated query values, dropping blanks
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    pub base_token: String,
    pub quote_token: String,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

pub async fn get_order_book(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookQuery>,
) -> Result<Response> {
    let book = state
        .orderbook
        .get_order_book(
            page_or_default(query.page.as_deref(), DEFAULT_PAGE),
            page_or_default(query.per_page.as_deref(), DEFAULT_PER_PAGE),
            &query.base_token,
            &query.quote_token,
        )
        .await?;
    Ok(Json(book).into_response())
}

#[derive(Debug, Deserialize)]
pub struct PricesQuery {
    pub hashes: String,
}

pub async fn get_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PricesQuery>,
) -> Result<Response> {
    let prices = state.orderbook.get_prices(&split_list(&query.hashes)).await?;
    Ok(Json(prices).into_response())
}

/// Separate paging and the non-column filters from the column filters
fn split_orders_query(
    mut params: HashMap<String, String>,
) -> (usize, usize, OrderFieldFilters, AdditionalFilters) {
    let page = page_or_default(params.remove(PAGE).as_deref(), DEFAULT_PAGE);
    let per_page = page_or_default(params.remove(PER_PAGE).as_deref(), DEFAULT_PER_PAGE);
    let additional = AdditionalFilters {
        is_unfillable: params
            .remove(IS_UNFILLABLE)
            .map_or(false, |v| v.eq_ignore_ascii_case("true")),
        trader: params.remove(TRADER).filter(|v| !v.is_empty()),
    };
    (page, per_page, params.into_iter().collect(), additional)
}

pub async fn get_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    let (page, per_page, field_filters, additional) = split_orders_query(params);
    let orders = state
        .orderbook
        .get_orders(page, per_page, &field_filters, &additional)
        .await?;
    Ok(Json(orders).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuery {
    pub maker_tokens: String,
    pub taker_tokens: String,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

pub async fn get_batch_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BatchQuery>,
) -> Result<Response> {
    let orders = state
        .orderbook
        .get_batch_orders(
            page_or_default(query.page.as_deref(), DEFAULT_PAGE),
            page_or_default(query.per_page.as_deref(), DEFAULT_PER_PAGE),
            &split_list(&query.maker_tokens),
            &split_list(&query.taker_tokens),
        )
        .await?;
    Ok(Json(orders).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

pub async fn get_fee_recipients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Json<PaginatedCollection<String>> {
    Json(state.orderbook.fee_recipients(
        page_or_default(query.page.as_deref(), DEFAULT_PAGE),
        page_or_default(query.per_page.as_deref(), DEFAULT_PER_PAGE),
    ))
}

pub async fn post_order_config(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderConfigRequest>,
) -> Json<OrderConfig> {
    Json(state.orderbook.order_config(&request))
}

pub async fn get_order_by_hash(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Response> {
    match state.orderbook.get_order_by_hash(&hash).await? {
        Some(order) => Ok(Json(order).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

pub async fn post_order(
    State(state): State<Arc<AppState>>,
    Json(order): Json<SignedOrder>,
) -> Result<StatusCode> {
    state.orderbook.add_order(order).await?;
    Ok(StatusCode::OK)
}

pub async fn post_orders(
    State(state): State<Arc<AppState>>,
    Json(orders): Json<Vec<SignedOrder>>,
) -> Result<StatusCode> {
    state.orderbook.add_orders(&orders).await?;
    Ok(StatusCode::OK)
}

pub async fn post_persistent_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(order): Json<SignedOrder>,
) -> Result<Response> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.orderbook.is_allowed_persistent_orders(api_key) {
        return Err(RelayerError::Unauthorized(
            "API key is not allowed to post persistent orders".to_string(),
        ));
    }

    let persisted = state
        .orderbook
        .add_persistent_orders(std::slice::from_ref(&order))
        .await?;
    Ok(Json(json!({ "persisted": persisted })).into_response())
}

#[derive(Debug, Deserialize)]
pub struct KindQuery {
    pub kind: OfferKind,
}

pub async fn get_offer_by_hash(
    State(state): State<Arc<AppState>>,
    Path(offer_hash): Path<String>,
    Query(query): Query<KindQuery>,
) -> Result<Response> {
    let offers = &state.offers;
    let found = match query.kind {
        OfferKind::CreatePool => offers
            .get_create_pool_offer(&offer_hash)
            .await?
            .map(|o| Json(o).into_response()),
        OfferKind::AddLiquidity => offers
            .get_add_liquidity_offer(&offer_hash)
            .await?
            .map(|o| Json(o).into_response()),
        OfferKind::RemoveLiquidity => offers
            .get_remove_liquidity_offer(&offer_hash)
            .await?
            .map(|o| Json(o).into_response()),
    };
    Ok(found.unwrap_or_else(|| StatusCode::NOT_FOUND.into_response()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffersQuery {
    pub kind: Option<OfferKind>,
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub maker: Option<String>,
    pub taker: Option<String>,
    pub maker_direction: Option<String>,
    pub reference_asset: Option<String>,
    pub collateral_token: Option<String>,
    pub data_provider: Option<String>,
    #[serde(rename = "permissionedERC721Token")]
    pub permissioned_token: Option<String>,
    pub pool_id: Option<String>,
}

impl OffersQuery {
    fn filter(&self) -> OfferFilter {
        OfferFilter {
            maker: self.maker.clone(),
            taker: self.taker.clone(),
            maker_direction: self.maker_direction.clone(),
            reference_asset: self.reference_asset.clone(),
            collateral_token: self.collateral_token.clone(),
            data_provider: self.data_provider.clone(),
            permissioned_token: self.permissioned_token.clone(),
            pool_id: self.pool_id.clone(),
        }
        .without_legacy_sentinels()
    }
}

pub async fn get_offers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OffersQuery>,
) -> Result<Response> {
    let filter = query.filter();
    let page = page_or_default(query.page.as_deref(), DEFAULT_PAGE);
    let per_page = page_or_default(query.per_page.as_deref(), DEFAULT_PER_PAGE);
    let offers = &state.offers;

    let response = match query.kind.unwrap_or(OfferKind::CreatePool) {
        OfferKind::CreatePool => {
            Json(offers.list_create_pool_offers(&filter, page, per_page).await?).into_response()
        }
        OfferKind::AddLiquidity => {
            Json(offers.list_add_liquidity_offers(&filter, page, per_page).await?).into_response()
        }
        OfferKind::RemoveLiquidity => Json(
            offers
                .list_remove_liquidity_offers(&filter, page, per_page)
                .await?,
        )
        .into_response(),
    };
    Ok(response)
}

pub async fn post_offer(
    State(state): State<Arc<AppState>>,
    Json(offer): Json<SubmittedOffer>,
) -> Result<Response> {
    let offer_hash = state.offers.submit(offer).await?;
    Ok(Json(json!({ "offerHash": offer_hash })).into_response())
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "component": "relayer-orderbook",
        "subscribers": state.publisher.subscriber_count(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&state.registry.gather(), &mut buffer) {
        return RelayerError::Config(format!("metrics encoding failed: {}", e)).into_response();
    }
    (
        [(axum::http::header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_query_separates_paging_and_extra_filters() {
        let params: HashMap<String, String> = [
            ("page", "2"),
            ("perPage", "bogus"),
            ("isUnfillable", "TRUE"),
            ("trader", "0xAAA"),
            ("maker", "0xAAA"),
            ("makerToken", "WETH"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let (page, per_page, fields, additional) = split_orders_query(params);
        assert_eq!(page, 2);
        assert_eq!(per_page, DEFAULT_PER_PAGE);
        assert!(additional.is_unfillable);
        assert_eq!(additional.trader.as_deref(), Some("0xAAA"));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("makerToken").map(String::as_str), Some("WETH"));
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list("0x1, 0x2,,"), vec!["0x1", "0x2"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_offers_query_strips_sentinels() {
        let query = OffersQuery {
            maker: Some(crate::config::NULL_ADDRESS.to_string()),
            pool_id: Some("24".to_string()),
            reference_asset: Some(String::new()),
            ..OffersQuery::default()
        };
        assert_eq!(
            query.filter(),
            OfferFilter {
                pool_id: Some("24".to_string()),
                ..OfferFilter::default()
            }
        );
    }
}
