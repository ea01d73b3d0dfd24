//! In-memory stores
//!
//! Rows are kept in `BTreeMap`s keyed by hash, so iteration order is already
//! the ascending-hash order queries paginate on.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::{Filter, OfferRecord, OfferRepository, OrderQuery, OrderStore, Table};
use crate::error::{RelayerError, Result};
use crate::order::StoredOrder;
use crate::watcher::ActiveOrderSink;

/// Order tables held in process memory
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    active: RwLock<BTreeMap<String, StoredOrder>>,
    persistent: RwLock<BTreeMap<String, StoredOrder>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, table: Table) -> &RwLock<BTreeMap<String, StoredOrder>> {
        match table {
            Table::Active => &self.active,
            Table::Persistent => &self.persistent,
        }
    }

    /// Insert or replace rows in the active table (watcher write path)
    pub fn upsert_active(&self, rows: impl IntoIterator<Item = StoredOrder>) {
        let mut active = self.active.write();
        for row in rows {
            active.insert(row.hash.clone(), row);
        }
    }

    /// Drop a row from the active table (watcher purge path)
    pub fn remove_active(&self, hash: &str) -> Option<StoredOrder> {
        self.active.write().remove(hash)
    }

    pub fn len(&self, table: Table) -> usize {
        self.table(table).read().len()
    }

    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }
}

impl ActiveOrderSink for MemoryOrderStore {
    fn record_accepted(&self, rows: Vec<StoredOrder>) {
        self.upsert_active(rows);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_by_hash(&self, table: Table, hash: &str) -> Result<Option<StoredOrder>> {
        Ok(self.table(table).read().get(hash).cloned())
    }

    async fn find(&self, table: Table, query: &OrderQuery) -> Result<Vec<StoredOrder>> {
        let rows = self.table(table).read();
        let matching = rows.values().filter(|row| query.filter.matches(row));

        let found = match query.window {
            Some(window) => matching
                .skip(window.skip)
                .take(window.take)
                .cloned()
                .collect(),
            None => matching.cloned().collect(),
        };
        Ok(found)
    }

    async fn count(&self, table: Table, filter: &Filter) -> Result<usize> {
        Ok(self
            .table(table)
            .read()
            .values()
            .filter(|row| filter.matches(row))
            .count())
    }

    async fn save_persistent(&self, rows: &[StoredOrder]) -> Result<()> {
        let mut persistent = self.persistent.write();
        for row in rows {
            persistent.insert(row.hash.clone(), row.clone());
        }
        Ok(())
    }
}

/// One offer collection held in process memory
#[derive(Debug)]
pub struct MemoryOfferRepository<T> {
    offers: RwLock<BTreeMap<String, T>>,
}

impl<T> Default for MemoryOfferRepository<T> {
    fn default() -> Self {
        Self {
            offers: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T> MemoryOfferRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: OfferRecord> OfferRepository<T> for MemoryOfferRepository<T> {
    async fn all(&self) -> Result<Vec<T>> {
        Ok(self.offers.read().values().cloned().collect())
    }

    async fn find_by_hash(&self, offer_hash: &str) -> Result<Option<T>> {
        Ok(self.offers.read().get(offer_hash).cloned())
    }

    async fn insert(&self, offer: T) -> Result<()> {
        let mut offers = self.offers.write();
        let key = offer.offer_hash().to_string();
        if offers.contains_key(&key) {
            return Err(RelayerError::DuplicateKey(key));
        }
        offers.insert(key, offer);
        Ok(())
    }
}
