//! Order filter tree
//!
//! Queries against the order tables are expressed as a small typed tree of
//! AND/OR nodes over field predicates. Stores compile the tree into their own
//! query language; `Filter::matches` is the reference evaluation used by the
//! in-memory store.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::order::{OrderState, StoredOrder};

/// Columns of the order tables that callers may filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderField {
    Hash,
    ChainId,
    VerifyingContract,
    Maker,
    Taker,
    MakerToken,
    TakerToken,
    MakerAmount,
    TakerAmount,
    Expiry,
    Salt,
    PoolId,
    Signature,
    RemainingFillableTakerAmount,
    OrderState,
}

impl OrderField {
    pub fn name(&self) -> &'static str {
        match self {
            OrderField::Hash => "hash",
            OrderField::ChainId => "chainId",
            OrderField::VerifyingContract => "verifyingContract",
            OrderField::Maker => "maker",
            OrderField::Taker => "taker",
            OrderField::MakerToken => "makerToken",
            OrderField::TakerToken => "takerToken",
            OrderField::MakerAmount => "makerAmount",
            OrderField::TakerAmount => "takerAmount",
            OrderField::Expiry => "expiry",
            OrderField::Salt => "salt",
            OrderField::PoolId => "poolId",
            OrderField::Signature => "signature",
            OrderField::RemainingFillableTakerAmount => "remainingFillableTakerAmount",
            OrderField::OrderState => "orderState",
        }
    }

    fn is_amount(&self) -> bool {
        matches!(
            self,
            OrderField::MakerAmount
                | OrderField::TakerAmount
                | OrderField::RemainingFillableTakerAmount
        )
    }

    /// Canonical text form of a filter value for this column
    pub fn normalize_value(&self, raw: &str) -> String {
        if self.is_amount() {
            if let Ok(amount) = Decimal::from_str(raw.trim()) {
                return amount.normalize().to_string();
            }
        }
        raw.to_string()
    }

    /// Column value of a row in canonical text form
    pub fn value_of(&self, row: &StoredOrder) -> Option<String> {
        match self {
            OrderField::Hash => Some(row.hash.clone()),
            OrderField::ChainId => row.chain_id.map(|v| v.to_string()),
            OrderField::VerifyingContract => row.verifying_contract.clone(),
            OrderField::Maker => row.maker.clone(),
            OrderField::Taker => row.taker.clone(),
            OrderField::MakerToken => row.maker_token.clone(),
            OrderField::TakerToken => row.taker_token.clone(),
            OrderField::MakerAmount => row.maker_amount.map(|v| v.normalize().to_string()),
            OrderField::TakerAmount => row.taker_amount.map(|v| v.normalize().to_string()),
            OrderField::Expiry => row.expiry.map(|v| v.to_string()),
            OrderField::Salt => row.salt.clone(),
            OrderField::PoolId => row.pool_id.clone(),
            OrderField::Signature => row.signature.clone(),
            OrderField::RemainingFillableTakerAmount => row
                .remaining_fillable_taker_amount
                .map(|v| v.normalize().to_string()),
            OrderField::OrderState => row.order_state.map(|s| s.as_str().to_string()),
        }
    }
}

impl FromStr for OrderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "hash" => OrderField::Hash,
            "chainId" => OrderField::ChainId,
            "verifyingContract" => OrderField::VerifyingContract,
            "maker" => OrderField::Maker,
            "taker" => OrderField::Taker,
            "makerToken" => OrderField::MakerToken,
            "takerToken" => OrderField::TakerToken,
            "makerAmount" => OrderField::MakerAmount,
            "takerAmount" => OrderField::TakerAmount,
            "expiry" => OrderField::Expiry,
            "salt" => OrderField::Salt,
            "poolId" => OrderField::PoolId,
            "signature" => OrderField::Signature,
            "remainingFillableTakerAmount" => OrderField::RemainingFillableTakerAmount,
            "orderState" => OrderField::OrderState,
            other => return Err(format!("not an order column: {}", other)),
        };
        Ok(field)
    }
}

/// Leaf condition on a single column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq(OrderField, String),
    In(OrderField, Vec<String>),
    ExpiryAtLeast(u64),
    StateIn(Vec<OrderState>),
}

impl Predicate {
    pub fn matches(&self, row: &StoredOrder) -> bool {
        match self {
            Predicate::Eq(field, value) => field.value_of(row).as_deref() == Some(value.as_str()),
            Predicate::In(field, values) => field
                .value_of(row)
                .map(|v| values.iter().any(|candidate| *candidate == v))
                .unwrap_or(false),
            Predicate::ExpiryAtLeast(min) => row.expiry.map(|e| e >= *min).unwrap_or(false),
            Predicate::StateIn(states) => row
                .order_state
                .map(|s| states.contains(&s))
                .unwrap_or(false),
        }
    }
}

/// Boolean tree of predicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Matches every row
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Pred(Predicate),
}

impl Filter {
    pub fn eq(field: OrderField, value: &str) -> Self {
        Filter::Pred(Predicate::Eq(field, field.normalize_value(value)))
    }

    pub fn is_in<I, S>(field: OrderField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Filter::Pred(Predicate::In(
            field,
            values
                .into_iter()
                .map(|v| field.normalize_value(v.as_ref()))
                .collect(),
        ))
    }

    pub fn expiry_at_least(min: u64) -> Self {
        Filter::Pred(Predicate::ExpiryAtLeast(min))
    }

    pub fn state_in(states: &[OrderState]) -> Self {
        Filter::Pred(Predicate::StateIn(states.to_vec()))
    }

    /// Conjoin `other` onto this filter, flattening nested ANDs
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    pub fn matches(&self, row: &StoredOrder) -> bool {
        match self {
            Filter::All => true,
            Filter::And(children) => children.iter().all(|f| f.matches(row)),
            Filter::Or(children) => children.iter().any(|f| f.matches(row)),
            Filter::Pred(predicate) => predicate.matches(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::tests::sample_order;
    use rust_decimal_macros::dec;

    fn row() -> StoredOrder {
        let mut order = sample_order("WETH", "DAI");
        order.maker_amount = dec!(3000.00);
        StoredOrder::from_signed(&order, OrderState::Added)
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in [
            OrderField::Maker,
            OrderField::MakerToken,
            OrderField::RemainingFillableTakerAmount,
            OrderField::OrderState,
        ] {
            assert_eq!(field.name().parse::<OrderField>().unwrap(), field);
        }
        assert!("feeRecipient".parse::<OrderField>().is_err());
    }

    #[test]
    fn test_eq_and_in_predicates() {
        let row = row();
        assert!(Filter::eq(OrderField::Maker, "0xAAA").matches(&row));
        assert!(!Filter::eq(OrderField::Maker, "0xaaa").matches(&row));
        assert!(Filter::eq(OrderField::MakerAmount, "3000").matches(&row));
        assert!(Filter::is_in(OrderField::MakerToken, ["DAI", "WETH"]).matches(&row));
        assert!(!Filter::is_in(OrderField::TakerToken, ["WETH"]).matches(&row));
    }

    #[test]
    fn test_missing_column_never_matches() {
        let mut row = row();
        row.expiry = None;
        row.order_state = None;
        assert!(!Filter::expiry_at_least(0).matches(&row));
        assert!(!Filter::state_in(&[OrderState::Added]).matches(&row));
    }

    #[test]
    fn test_boolean_nodes() {
        let row = row();
        let yes = Filter::eq(OrderField::Maker, "0xAAA");
        let no = Filter::eq(OrderField::Maker, "0xBBB");

        assert!(Filter::Or(vec![no.clone(), yes.clone()]).matches(&row));
        assert!(!Filter::And(vec![no.clone(), yes.clone()]).matches(&row));
        assert!(!Filter::Or(vec![]).matches(&row));
        assert!(Filter::All.matches(&row));
        assert!(Filter::All.and(yes.clone()).matches(&row));
    }

    #[test]
    fn test_and_flattens() {
        let a = Filter::eq(OrderField::Maker, "a");
        let b = Filter::eq(OrderField::Taker, "b");
        let c = Filter::expiry_at_least(10);

        let combined = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(combined, Filter::And(vec![a.clone(), b, c]));
        assert_eq!(Filter::All.and(a.clone()), a);
    }
}
