//! Order book service
//!
//! Serves single-order lookups, two-sided books, filtered order queries and
//! batch queries, and ingests orders through the watcher. Every operation is
//! an independent unit of work; ingestion, book recomputation and
//! notification run as sequential steps without a spanning transaction.

use futures_util::future::try_join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::book::build_order_book;
use super::freshness::{group_by_freshness_at, log_expired_orders, now_secs};
use super::{OrderbookResponse, PoolBookSnapshot, RelayerMetrics};
use crate::config::{Config, DEFAULT_PAGE, DEFAULT_PER_PAGE, NULL_ADDRESS};
use crate::error::{RelayerError, Result};
use crate::order::{decode_rows, RelayerOrder, SignedOrder, StoredOrder, TERMINAL_STATES};
use crate::pagination::{db_window, paginate, paginate_serialize, PaginatedCollection};
use crate::publisher::Publisher;
use crate::store::{Filter, OrderField, OrderQuery, OrderStore, Table};
use crate::watcher::OrderWatcher;

/// Column filters keyed by wire field name; unknown names are ignored
pub type OrderFieldFilters = BTreeMap<String, String>;

/// Filters that do not map onto a single column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionalFilters {
    /// Also return terminal orders from the persistent table
    pub is_unfillable: bool,
    /// Match orders where this address is either maker or taker
    pub trader: Option<String>,
}

/// Price of a single order, in taker token per unit of maker token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPrice {
    pub order_hash: String,
    pub maker_token: String,
    pub taker_token: String,
    pub price: Option<Decimal>,
}

/// Order field values the relayer requires on submitted orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfig {
    pub fee_recipient: String,
    pub sender: String,
    pub taker_token_fee_amount: Decimal,
}

/// Draft order a maker asks the relayer to configure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfigRequest {
    pub maker: String,
    pub taker: String,
    pub maker_amount: Decimal,
    pub taker_amount: Decimal,
    pub maker_token: String,
    pub taker_token: String,
    pub verifying_contract: String,
    pub expiry: u64,
}

/// Relayer order book over the active and persistent order tables
pub struct OrderBookService {
    store: Arc<dyn OrderStore>,
    watcher: Arc<dyn OrderWatcher>,
    publisher: Arc<Publisher>,
    config: Arc<Config>,
    metrics: Arc<RelayerMetrics>,
}

impl OrderBookService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        watcher: Arc<dyn OrderWatcher>,
        publisher: Arc<Publisher>,
        config: Arc<Config>,
        metrics: Arc<RelayerMetrics>,
    ) -> Self {
        Self {
            store,
            watcher,
            publisher,
            config,
            metrics,
        }
    }

    /// Whether `api_key` may post persistent orders
    pub fn is_allowed_persistent_orders(&self, api_key: &str) -> bool {
        self.config
            .persistent_order_api_keys
            .iter()
            .any(|key| key == api_key)
    }

    /// Fee recipient addresses used by this relayer
    pub fn fee_recipients(&self, page: usize, per_page: usize) -> PaginatedCollection<String> {
        paginate(vec![self.config.fee_recipient.clone()], page, per_page)
    }

    /// Field values a draft order must carry to be accepted here
    pub fn order_config(&self, request: &OrderConfigRequest) -> OrderConfig {
        debug!(
            maker = %request.maker,
            maker_token = %request.maker_token,
            taker_token = %request.taker_token,
            "Order config requested"
        );
        OrderConfig {
            fee_recipient: self.config.fee_recipient.clone(),
            sender: NULL_ADDRESS.to_string(),
            taker_token_fee_amount: self.config.taker_token_fee_amount,
        }
    }

    /// Look an order up in the active table, then the persistent one
    pub async fn get_order_by_hash(&self, hash: &str) -> Result<Option<RelayerOrder>> {
        let row = match self.store.find_by_hash(Table::Active, hash).await? {
            Some(row) => Some(row),
            None => self.store.find_by_hash(Table::Persistent, hash).await?,
        };
        row.map(RelayerOrder::try_from).transpose()
    }

    /// Fresh bids and asks for a token pair
    pub async fn get_order_book(
        &self,
        page: usize,
        per_page: usize,
        base_token: &str,
        quote_token: &str,
    ) -> Result<OrderbookResponse> {
        let pair = [base_token, quote_token];
        let filter = Filter::is_in(OrderField::MakerToken, pair)
            .and(Filter::is_in(OrderField::TakerToken, pair));

        let rows = self.store.find(Table::Active, &OrderQuery::all(filter)).await?;
        let orders = decode_rows(rows)?;

        Ok(build_order_book(
            orders,
            base_token,
            quote_token,
            page,
            per_page,
            self.config.order_expiration_buffer_secs,
            now_secs(),
        ))
    }

    /// Filtered order query over the active table, optionally joined with
    /// terminal orders from the persistent table
    ///
    /// Each table is windowed against its own count, so pages that straddle
    /// the boundary between the two sources may overlap or leave gaps.
    pub async fn get_orders(
        &self,
        page: usize,
        per_page: usize,
        field_filters: &OrderFieldFilters,
        additional: &AdditionalFilters,
    ) -> Result<PaginatedCollection<RelayerOrder>> {
        if additional.is_unfillable && !field_filters.contains_key(OrderField::Maker.name()) {
            return Err(RelayerError::unfillable_requires_maker());
        }

        let clauses = match &additional.trader {
            Some(trader) => vec![
                column_clause(field_filters, Some(OrderField::Maker))
                    .and(Filter::eq(OrderField::Maker, trader)),
                column_clause(field_filters, Some(OrderField::Taker))
                    .and(Filter::eq(OrderField::Taker, trader)),
            ],
            None => vec![column_clause(field_filters, None)],
        };

        let min_expiry = now_secs().saturating_add(self.config.order_expiration_buffer_secs);
        let active_filter = Filter::Or(
            clauses
                .iter()
                .map(|clause| clause.clone().and(Filter::expiry_at_least(min_expiry)))
                .collect(),
        );
        let persistent_filter = Filter::Or(
            clauses
                .into_iter()
                .map(|clause| clause.and(Filter::state_in(&TERMINAL_STATES)))
                .collect(),
        );

        let window = db_window(page, per_page);
        let active_query = OrderQuery::page(active_filter.clone(), window);
        let persistent_query = OrderQuery::page(persistent_filter.clone(), window);

        let active = async {
            tokio::try_join!(
                self.store.count(Table::Active, &active_filter),
                self.store.find(Table::Active, &active_query),
            )
        };
        let persistent = async {
            if additional.is_unfillable {
                tokio::try_join!(
                    self.store.count(Table::Persistent, &persistent_filter),
                    self.store.find(Table::Persistent, &persistent_query),
                )
            } else {
                Ok((0, Vec::new()))
            }
        };

        let ((active_count, active_rows), (persistent_count, persistent_rows)) =
            tokio::try_join!(active, persistent)?;

        let mut records = decode_rows(active_rows)?;
        records.extend(decode_rows(persistent_rows)?);

        debug!(
            active = active_count,
            persistent = persistent_count,
            returned = records.len(),
            "Order query complete"
        );

        Ok(paginate_serialize(
            records,
            active_count + persistent_count,
            page,
            per_page,
        ))
    }

    /// Fresh active orders for any of the given maker and taker tokens
    pub async fn get_batch_orders(
        &self,
        page: usize,
        per_page: usize,
        maker_tokens: &[String],
        taker_tokens: &[String],
    ) -> Result<PaginatedCollection<RelayerOrder>> {
        let filter = Filter::is_in(OrderField::MakerToken, maker_tokens)
            .and(Filter::is_in(OrderField::TakerToken, taker_tokens));

        let rows = self.store.find(Table::Active, &OrderQuery::all(filter)).await?;
        let orders = decode_rows(rows)?;

        let now = now_secs();
        let groups = group_by_freshness_at(orders, self.config.order_expiration_buffer_secs, now);
        if log_expired_orders(
            &groups.expired,
            self.config.max_order_expiration_buffer_secs,
            now,
        ) {
            self.metrics.expired_order_diagnostics.inc();
        }

        Ok(paginate(groups.fresh, page, per_page))
    }

    /// Prices of the orders with the given hashes; unknown hashes are skipped
    pub async fn get_prices(&self, hashes: &[String]) -> Result<Vec<OrderPrice>> {
        let found = try_join_all(hashes.iter().map(|hash| self.get_order_by_hash(hash))).await?;

        Ok(found
            .into_iter()
            .flatten()
            .map(|order| OrderPrice {
                price: order.order.taker_amount.checked_div(order.order.maker_amount),
                order_hash: order.meta_data.order_hash,
                maker_token: order.order.maker_token,
                taker_token: order.order.taker_token,
            })
            .collect())
    }

    pub async fn add_order(&self, order: SignedOrder) -> Result<()> {
        self.add_orders(std::slice::from_ref(&order)).await
    }

    /// Submit orders to the watcher and notify subscribers of the new books
    pub async fn add_orders(&self, orders: &[SignedOrder]) -> Result<()> {
        self.ingest(orders).await.map(|_| ())
    }

    /// Submit orders, then copy the ones the watcher accepted into the
    /// persistent table; returns the number of orders persisted
    ///
    /// Accepted rows are looked up under the hashes the watcher reported.
    /// Chunks are written one at a time; a failing chunk leaves earlier
    /// chunks committed.
    pub async fn add_persistent_orders(&self, orders: &[SignedOrder]) -> Result<usize> {
        let accepted_hashes = self.ingest(orders).await?;
        if accepted_hashes.is_empty() {
            info!(submitted = orders.len(), "No persistent orders accepted");
            return Ok(0);
        }

        let accepted: Vec<StoredOrder> = self
            .store
            .find(
                Table::Active,
                &OrderQuery::all(Filter::is_in(OrderField::Hash, &accepted_hashes)),
            )
            .await?;

        let mut persisted = 0;
        for chunk in accepted.chunks(self.config.orders_update_chunk_size.max(1)) {
            self.store.save_persistent(chunk).await?;
            persisted += chunk.len();
            self.metrics.orders_persisted.inc_by(chunk.len() as u64);
        }

        info!(
            submitted = orders.len(),
            accepted = accepted_hashes.len(),
            persisted,
            "Persistent orders stored"
        );
        Ok(persisted)
    }

    /// Post to the watcher, publish fresh snapshots and return the accepted
    /// hashes
    async fn ingest(&self, orders: &[SignedOrder]) -> Result<Vec<String>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let accepted = self.watcher.post_orders(orders).await?;
        self.metrics.orders_submitted.inc_by(orders.len() as u64);

        let snapshots = self.pool_snapshots(orders).await?;
        match self.publisher.publish(&snapshots) {
            Ok(delivered) => {
                self.metrics.snapshots_published.inc();
                debug!(pools = snapshots.len(), delivered, "Book snapshots published");
            }
            Err(e) => warn!(error = %e, "Failed to publish book snapshots"),
        }

        Ok(accepted)
    }

    /// Both orientations of the book for each distinct pool in the batch
    async fn pool_snapshots(&self, orders: &[SignedOrder]) -> Result<Vec<PoolBookSnapshot>> {
        let mut seen = HashSet::new();
        let mut representatives = Vec::new();
        for order in orders {
            if seen.insert(order.pool_id.as_str()) {
                representatives.push(order);
            }
        }

        try_join_all(representatives.into_iter().map(|order| self.pool_snapshot(order))).await
    }

    async fn pool_snapshot(&self, order: &SignedOrder) -> Result<PoolBookSnapshot> {
        let (first, second) = tokio::try_join!(
            self.get_order_book(
                DEFAULT_PAGE,
                DEFAULT_PER_PAGE,
                &order.maker_token,
                &order.taker_token
            ),
            self.get_order_book(
                DEFAULT_PAGE,
                DEFAULT_PER_PAGE,
                &order.taker_token,
                &order.maker_token
            ),
        )?;

        Ok(PoolBookSnapshot {
            pool_id: order.pool_id.clone(),
            first,
            second,
        })
    }
}

/// AND of the recognised column filters, leaving out `skip`
fn column_clause(field_filters: &OrderFieldFilters, skip: Option<OrderField>) -> Filter {
    field_filters
        .iter()
        .filter_map(|(name, value)| {
            let field = name.parse::<OrderField>().ok()?;
            (Some(field) != skip).then(|| Filter::eq(field, value))
        })
        .fold(Filter::All, Filter::and)
}
