//! Order and offer storage
//!
//! Orders live in two tables: the active table, written by the order watcher,
//! and the persistent table, which keeps snapshots of promoted orders after
//! they reach a terminal state. Offers live in one collection per kind.

mod filter;
mod memory;

pub use filter::{Filter, OrderField, Predicate};
pub use memory::{MemoryOfferRepository, MemoryOrderStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::offer::{AddLiquidityOffer, CreatePoolOffer, RemoveLiquidityOffer};
use crate::order::StoredOrder;
use crate::pagination::Window;

/// Which order table a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Active,
    Persistent,
}

/// Row query against one order table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub filter: Filter,
    pub window: Option<Window>,
    pub order_by_hash: bool,
}

impl OrderQuery {
    /// Every matching row, unordered
    pub fn all(filter: Filter) -> Self {
        Self {
            filter,
            window: None,
            order_by_hash: false,
        }
    }

    /// One window of matching rows, ascending by hash
    pub fn page(filter: Filter, window: Window) -> Self {
        Self {
            filter,
            window: Some(window),
            order_by_hash: true,
        }
    }
}

/// Storage backend for the order tables
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_hash(&self, table: Table, hash: &str) -> Result<Option<StoredOrder>>;

    async fn find(&self, table: Table, query: &OrderQuery) -> Result<Vec<StoredOrder>>;

    async fn count(&self, table: Table, filter: &Filter) -> Result<usize>;

    /// Upsert one chunk of rows into the persistent table
    async fn save_persistent(&self, rows: &[StoredOrder]) -> Result<()>;
}

/// Records keyed by offer hash
pub trait OfferRecord: Clone + Send + Sync + 'static {
    fn offer_hash(&self) -> &str;
}

impl OfferRecord for CreatePoolOffer {
    fn offer_hash(&self) -> &str {
        &self.offer_hash
    }
}

impl OfferRecord for AddLiquidityOffer {
    fn offer_hash(&self) -> &str {
        &self.offer_hash
    }
}

impl OfferRecord for RemoveLiquidityOffer {
    fn offer_hash(&self) -> &str {
        &self.offer_hash
    }
}

/// Storage backend for one offer collection
#[async_trait]
pub trait OfferRepository<T: OfferRecord>: Send + Sync {
    async fn all(&self) -> Result<Vec<T>>;

    async fn find_by_hash(&self, offer_hash: &str) -> Result<Option<T>>;

    /// Insert a new offer; fails with `DuplicateKey` if the hash exists
    async fn insert(&self, offer: T) -> Result<()>;
}
