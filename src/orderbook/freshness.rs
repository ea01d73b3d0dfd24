//! Order freshness
//!
//! An order is fresh while its expiry lies beyond `now + buffer`, so orders
//! about to expire are already treated as stale.

use tracing::error;

use crate::order::RelayerOrder;

/// Current unix time in seconds
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub fn is_fresh_at(order: &RelayerOrder, buffer_secs: u64, now: u64) -> bool {
    order.order.expiry > now.saturating_add(buffer_secs)
}

pub fn is_fresh(order: &RelayerOrder, buffer_secs: u64) -> bool {
    is_fresh_at(order, buffer_secs, now_secs())
}

/// Disjoint split of a set of orders; input order is preserved on each side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Freshness {
    pub fresh: Vec<RelayerOrder>,
    pub expired: Vec<RelayerOrder>,
}

pub fn group_by_freshness_at(orders: Vec<RelayerOrder>, buffer_secs: u64, now: u64) -> Freshness {
    let (fresh, expired) = orders
        .into_iter()
        .partition(|order| is_fresh_at(order, buffer_secs, now));
    Freshness { fresh, expired }
}

pub fn group_by_freshness(orders: Vec<RelayerOrder>, buffer_secs: u64) -> Freshness {
    group_by_freshness_at(orders, buffer_secs, now_secs())
}

/// First expired order whose expiry still lies beyond `now + max_buffer`
///
/// Such an order should already have been purged by the watcher.
pub fn find_stale_expired(
    expired: &[RelayerOrder],
    max_buffer_secs: u64,
    now: u64,
) -> Option<&RelayerOrder> {
    let horizon = now.saturating_add(max_buffer_secs);
    expired.iter().find(|order| order.order.expiry > horizon)
}

/// Log the watcher-lag diagnostic; returns whether it fired
pub fn log_expired_orders(expired: &[RelayerOrder], max_buffer_secs: u64, now: u64) -> bool {
    match find_stale_expired(expired, max_buffer_secs, now) {
        Some(order) => {
            error!(
                order_hash = %order.hash(),
                expiry = order.order.expiry,
                max_expiration_buffer_secs = max_buffer_secs,
                expired_count = expired.len(),
                "Found expired order beyond the maximum expiration buffer"
            );
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;
    use crate::order::{OrderState, StoredOrder};

    fn order_expiring(expiry: u64, salt: u32) -> RelayerOrder {
        let mut order = sample_order("WETH", "DAI");
        order.expiry = expiry;
        order.salt = salt.to_string();
        RelayerOrder::try_from(StoredOrder::from_signed(&order, OrderState::Added)).unwrap()
    }

    #[test]
    fn test_is_fresh_boundary() {
        let now = 1_000;
        assert!(is_fresh_at(&order_expiring(1_011, 0), 10, now));
        assert!(!is_fresh_at(&order_expiring(1_010, 0), 10, now));
        assert!(!is_fresh_at(&order_expiring(999, 0), 0, now));
    }

    #[test]
    fn test_order_expired_one_second_ago_is_stale() {
        let order = order_expiring(now_secs() - 1, 0);
        assert!(!is_fresh(&order, 0));
    }

    #[test]
    fn test_group_by_freshness_partitions() {
        let now = 1_000;
        let orders: Vec<RelayerOrder> = (0..10u32)
            .map(|i| order_expiring(995 + u64::from(i) * 3, i))
            .collect();

        let groups = group_by_freshness_at(orders.clone(), 5, now);
        assert_eq!(groups.fresh.len() + groups.expired.len(), orders.len());
        assert!(groups.fresh.iter().all(|o| is_fresh_at(o, 5, now)));
        assert!(groups.expired.iter().all(|o| !is_fresh_at(o, 5, now)));
        for order in &orders {
            let in_fresh = groups.fresh.contains(order);
            let in_expired = groups.expired.contains(order);
            assert!(in_fresh ^ in_expired);
        }
    }

    #[test]
    fn test_stale_expired_diagnostic() {
        let now = 1_000;
        let expired = vec![order_expiring(990, 0), order_expiring(1_500, 1)];

        let flagged = find_stale_expired(&expired, 100, now).unwrap();
        assert_eq!(flagged.order.expiry, 1_500);
        assert!(log_expired_orders(&expired, 100, now));
        assert!(!log_expired_orders(&expired, 1_000, now));
        assert!(!log_expired_orders(&[], 0, now));
    }
}
