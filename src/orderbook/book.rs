//! Two-sided book construction
//!
//! For a (base, quote) pair, bids are orders paying quote for base
//! (`makerToken = quote`, `takerToken = base`) and asks are the inverse.
//! Both sides are priced in quote per unit of base.

use rust_decimal::Decimal;
use std::cmp::Ordering;

use super::freshness::is_fresh_at;
use super::OrderbookResponse;
use crate::order::{RelayerOrder, SignedOrder};
use crate::pagination::paginate;

/// Quote offered per unit of base, `None` if the taker amount is zero
pub fn bid_price(order: &SignedOrder) -> Option<Decimal> {
    order.maker_amount.checked_div(order.taker_amount)
}

/// Quote asked per unit of base, `None` if the maker amount is zero
pub fn ask_price(order: &SignedOrder) -> Option<Decimal> {
    order.taker_amount.checked_div(order.maker_amount)
}

/// Unpriceable orders rank after every priced one
fn rank(a: Option<Decimal>, b: Option<Decimal>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Best bid first: descending price, then ascending hash
pub fn compare_bids(a: &RelayerOrder, b: &RelayerOrder) -> Ordering {
    rank(bid_price(&a.order), bid_price(&b.order), true).then_with(|| a.hash().cmp(b.hash()))
}

/// Best ask first: ascending price, then ascending hash
pub fn compare_asks(a: &RelayerOrder, b: &RelayerOrder) -> Ordering {
    rank(ask_price(&a.order), ask_price(&b.order), false).then_with(|| a.hash().cmp(b.hash()))
}

/// Partition, filter, sort and paginate orders into a book for (base, quote)
pub fn build_order_book(
    orders: Vec<RelayerOrder>,
    base_token: &str,
    quote_token: &str,
    page: usize,
    per_page: usize,
    buffer_secs: u64,
    now: u64,
) -> OrderbookResponse {
    let mut bids = Vec::new();
    let mut asks = Vec::new();

    for order in orders {
        if !is_fresh_at(&order, buffer_secs, now) {
            continue;
        }
        let (maker, taker) = (order.order.maker_token.as_str(), order.order.taker_token.as_str());
        if maker == quote_token && taker == base_token {
            bids.push(order);
        } else if maker == base_token && taker == quote_token {
            asks.push(order);
        }
    }

    bids.sort_by(compare_bids);
    asks.sort_by(compare_asks);

    OrderbookResponse {
        bids: paginate(bids, page, per_page),
        asks: paginate(asks, page, per_page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;
    use crate::order::{OrderState, StoredOrder};
    use rust_decimal_macros::dec;

    const NOW: u64 = 1_700_000_000;

    fn order(
        maker_token: &str,
        taker_token: &str,
        maker_amount: Decimal,
        taker_amount: Decimal,
        salt: &str,
    ) -> RelayerOrder {
        let mut order = sample_order(maker_token, taker_token);
        order.maker_amount = maker_amount;
        order.taker_amount = taker_amount;
        order.expiry = NOW + 3_600;
        order.salt = salt.to_string();
        RelayerOrder::try_from(StoredOrder::from_signed(&order, OrderState::Added)).unwrap()
    }

    #[test]
    fn test_weth_dai_book() {
        let bid = order("DAI", "WETH", dec!(3000), dec!(1), "a");
        let ask = order("WETH", "DAI", dec!(1), dec!(2900), "b");

        let book = build_order_book(vec![bid.clone(), ask.clone()], "WETH", "DAI", 1, 10, 0, NOW);
        assert_eq!(book.bids.records, vec![bid.clone()]);
        assert_eq!(book.asks.records, vec![ask.clone()]);
        assert_eq!(bid_price(&bid.order), Some(dec!(3000)));
        assert_eq!(ask_price(&ask.order), Some(dec!(2900)));
    }

    #[test]
    fn test_orientation_and_ordering() {
        let orders = vec![
            order("DAI", "WETH", dec!(2900), dec!(1), "1"),
            order("DAI", "WETH", dec!(3100), dec!(1), "2"),
            order("DAI", "WETH", dec!(6000), dec!(2), "3"),
            order("WETH", "DAI", dec!(1), dec!(3200), "4"),
            order("WETH", "DAI", dec!(2), dec!(6300), "5"),
            order("WETH", "USDC", dec!(1), dec!(3000), "6"),
            order("USDC", "DAI", dec!(1), dec!(1), "7"),
        ];

        let book = build_order_book(orders, "WETH", "DAI", 1, 10, 0, NOW);

        assert_eq!(book.bids.total, 3);
        assert_eq!(book.asks.total, 2);
        assert!(book
            .bids
            .records
            .iter()
            .all(|o| o.order.maker_token == "DAI" && o.order.taker_token == "WETH"));
        assert!(book
            .asks
            .records
            .iter()
            .all(|o| o.order.maker_token == "WETH" && o.order.taker_token == "DAI"));

        let bid_prices: Vec<Decimal> = book.bids.records.iter().filter_map(|o| bid_price(&o.order)).collect();
        assert!(bid_prices.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(bid_prices[0], dec!(3100));

        let ask_prices: Vec<Decimal> = book.asks.records.iter().filter_map(|o| ask_price(&o.order)).collect();
        assert!(ask_prices.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ask_prices, vec![dec!(3150), dec!(3200)]);
    }

    #[test]
    fn test_equal_prices_break_ties_by_hash() {
        let a = order("DAI", "WETH", dec!(3000), dec!(1), "x");
        let b = order("DAI", "WETH", dec!(6000), dec!(2), "y");

        let book = build_order_book(vec![a.clone(), b.clone()], "WETH", "DAI", 1, 10, 0, NOW);
        let hashes: Vec<&str> = book.bids.records.iter().map(|o| o.hash()).collect();
        let mut expected = vec![a.hash(), b.hash()];
        expected.sort();
        assert_eq!(hashes, expected);
    }

    #[test]
    fn test_unpriceable_orders_rank_last() {
        let zero = order("DAI", "WETH", dec!(3000), dec!(0), "z");
        let priced = order("DAI", "WETH", dec!(1), dec!(1), "p");
        assert_eq!(compare_bids(&priced, &zero), Ordering::Less);

        let zero_ask = order("WETH", "DAI", dec!(0), dec!(1), "z");
        let priced_ask = order("WETH", "DAI", dec!(1), dec!(9999), "p");
        assert_eq!(compare_asks(&priced_ask, &zero_ask), Ordering::Less);
    }

    #[test]
    fn test_stale_orders_excluded() {
        let mut stale = order("DAI", "WETH", dec!(3000), dec!(1), "s");
        stale.order.expiry = NOW - 1;
        let almost = {
            let mut o = order("DAI", "WETH", dec!(3000), dec!(1), "t");
            o.order.expiry = NOW + 5;
            o
        };

        let book = build_order_book(vec![stale, almost], "WETH", "DAI", 1, 10, 10, NOW);
        assert!(book.bids.records.is_empty());
        assert_eq!(book.bids.total, 0);
    }

    #[test]
    fn test_sides_paginate_independently() {
        let mut orders = Vec::new();
        for i in 0..5 {
            orders.push(order("DAI", "WETH", Decimal::from(3000 + i), dec!(1), &format!("b{}", i)));
        }
        orders.push(order("WETH", "DAI", dec!(1), dec!(3100), "a0"));

        let book = build_order_book(orders, "WETH", "DAI", 2, 2, 0, NOW);
        assert_eq!(book.bids.total, 5);
        assert_eq!(book.bids.records.len(), 2);
        assert_eq!(bid_price(&book.bids.records[0].order), Some(dec!(3002)));
        assert_eq!(book.asks.total, 1);
        assert!(book.asks.records.is_empty());
    }
}
