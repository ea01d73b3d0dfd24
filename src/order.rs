//! Order shapes
//!
//! `SignedOrder` is what clients submit, `StoredOrder` is a row in either the
//! active or the persistent table, and `RelayerOrder` is the public shape
//! returned by every query. Rows are decoded into the public shape through an
//! explicit, validated conversion.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{RelayerError, Result};

/// Off-chain signed limit order as submitted by a maker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    pub chain_id: u64,
    pub verifying_contract: String,
    pub maker: String,
    pub taker: String,
    pub maker_token: String,
    pub taker_token: String,
    pub maker_amount: Decimal,
    pub taker_amount: Decimal,
    /// Unix seconds
    pub expiry: u64,
    pub salt: String,
    pub pool_id: String,
    pub signature: String,
}

impl SignedOrder {
    /// Content-derived order hash (`0x`-prefixed SHA-256 of the order fields)
    ///
    /// The signature is not part of the hashed content. This is a local key
    /// for rows this crate builds itself and is not the protocol order hash;
    /// rows accepted by the watcher are keyed by the hash it reports.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        let fields = [
            self.chain_id.to_string(),
            self.verifying_contract.clone(),
            self.maker.clone(),
            self.taker.clone(),
            self.maker_token.clone(),
            self.taker_token.clone(),
            self.maker_amount.normalize().to_string(),
            self.taker_amount.normalize().to_string(),
            self.expiry.to_string(),
            self.salt.clone(),
            self.pool_id.clone(),
        ];
        for field in &fields {
            hasher.update(field.as_bytes());
            hasher.update(b"|");
        }
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

/// Lifecycle state assigned by the order watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Added,
    Filled,
    FullyFilled,
    Cancelled,
    Expired,
    Invalid,
    Unexpired,
    Unfunded,
    FillabilityIncreased,
    StoppedWatching,
}

/// States after which an order can no longer be filled
pub const TERMINAL_STATES: [OrderState; 6] = [
    OrderState::Cancelled,
    OrderState::Expired,
    OrderState::FullyFilled,
    OrderState::Invalid,
    OrderState::StoppedWatching,
    OrderState::Unfunded,
];

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATES.contains(self)
    }

    /// Wire name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Added => "ADDED",
            OrderState::Filled => "FILLED",
            OrderState::FullyFilled => "FULLY_FILLED",
            OrderState::Cancelled => "CANCELLED",
            OrderState::Expired => "EXPIRED",
            OrderState::Invalid => "INVALID",
            OrderState::Unexpired => "UNEXPIRED",
            OrderState::Unfunded => "UNFUNDED",
            OrderState::FillabilityIncreased => "FILLABILITY_INCREASED",
            OrderState::StoppedWatching => "STOPPED_WATCHING",
        }
    }
}

/// A row in the active or persistent order table
///
/// Every column but the key is nullable at the storage level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOrder {
    pub hash: String,
    pub chain_id: Option<u64>,
    pub verifying_contract: Option<String>,
    pub maker: Option<String>,
    pub taker: Option<String>,
    pub maker_token: Option<String>,
    pub taker_token: Option<String>,
    pub maker_amount: Option<Decimal>,
    pub taker_amount: Option<Decimal>,
    pub expiry: Option<u64>,
    pub salt: Option<String>,
    pub pool_id: Option<String>,
    pub signature: Option<String>,
    pub remaining_fillable_taker_amount: Option<Decimal>,
    pub order_state: Option<OrderState>,
}

impl StoredOrder {
    /// Build a fully populated row for a freshly accepted order
    pub fn from_signed(order: &SignedOrder, state: OrderState) -> Self {
        Self {
            hash: order.hash(),
            chain_id: Some(order.chain_id),
            verifying_contract: Some(order.verifying_contract.clone()),
            maker: Some(order.maker.clone()),
            taker: Some(order.taker.clone()),
            maker_token: Some(order.maker_token.clone()),
            taker_token: Some(order.taker_token.clone()),
            maker_amount: Some(order.maker_amount),
            taker_amount: Some(order.taker_amount),
            expiry: Some(order.expiry),
            salt: Some(order.salt.clone()),
            pool_id: Some(order.pool_id.clone()),
            signature: Some(order.signature.clone()),
            remaining_fillable_taker_amount: Some(order.taker_amount),
            order_state: Some(state),
        }
    }
}

impl From<&RelayerOrder> for StoredOrder {
    fn from(order: &RelayerOrder) -> Self {
        let mut row = StoredOrder::from_signed(&order.order, order.meta_data.state);
        row.hash = order.meta_data.order_hash.clone();
        row.remaining_fillable_taker_amount = Some(order.meta_data.remaining_fillable_taker_amount);
        row
    }
}

/// Watcher-maintained metadata returned alongside each order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetaData {
    pub order_hash: String,
    pub remaining_fillable_taker_amount: Decimal,
    pub state: OrderState,
}

/// Public order shape served by the relayer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerOrder {
    pub order: SignedOrder,
    pub meta_data: OrderMetaData,
}

impl RelayerOrder {
    pub fn hash(&self) -> &str {
        &self.meta_data.order_hash
    }
}

fn required<T>(value: Option<T>, hash: &str, field: &'static str) -> Result<T> {
    value.ok_or_else(|| RelayerError::Decode {
        hash: hash.to_string(),
        field,
    })
}

impl TryFrom<StoredOrder> for RelayerOrder {
    type Error = RelayerError;

    fn try_from(row: StoredOrder) -> Result<Self> {
        let hash = row.hash;
        let order = SignedOrder {
            chain_id: required(row.chain_id, &hash, "chainId")?,
            verifying_contract: required(row.verifying_contract, &hash, "verifyingContract")?,
            maker: required(row.maker, &hash, "maker")?,
            taker: required(row.taker, &hash, "taker")?,
            maker_token: required(row.maker_token, &hash, "makerToken")?,
            taker_token: required(row.taker_token, &hash, "takerToken")?,
            maker_amount: required(row.maker_amount, &hash, "makerAmount")?,
            taker_amount: required(row.taker_amount, &hash, "takerAmount")?,
            expiry: required(row.expiry, &hash, "expiry")?,
            salt: required(row.salt, &hash, "salt")?,
            pool_id: required(row.pool_id, &hash, "poolId")?,
            signature: required(row.signature, &hash, "signature")?,
        };
        let meta_data = OrderMetaData {
            remaining_fillable_taker_amount: required(
                row.remaining_fillable_taker_amount,
                &hash,
                "remainingFillableTakerAmount",
            )?,
            state: required(row.order_state, &hash, "orderState")?,
            order_hash: hash,
        };
        Ok(RelayerOrder { order, meta_data })
    }
}

/// Decode a batch of rows, failing on the first incomplete one
pub fn decode_rows(rows: Vec<StoredOrder>) -> Result<Vec<RelayerOrder>> {
    rows.into_iter().map(RelayerOrder::try_from).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn sample_order(maker_token: &str, taker_token: &str) -> SignedOrder {
        SignedOrder {
            chain_id: 5,
            verifying_contract: "0x6cdec9b70431bf650f3a0ddd0e246368a4c4f1e1".to_string(),
            maker: "0xAAA".to_string(),
            taker: NULL_TAKER.to_string(),
            maker_token: maker_token.to_string(),
            taker_token: taker_token.to_string(),
            maker_amount: dec!(1),
            taker_amount: dec!(1),
            expiry: 4_102_444_800,
            salt: "1665501187956".to_string(),
            pool_id: "24".to_string(),
            signature: "{\"v\":27}".to_string(),
        }
    }

    const NULL_TAKER: &str = "0x0000000000000000000000000000000000000000";

    #[test]
    fn test_hash_is_content_derived() {
        let a = sample_order("WETH", "DAI");
        let mut b = a.clone();
        assert_eq!(a.hash(), b.hash());

        b.signature = "other".to_string();
        assert_eq!(a.hash(), b.hash());

        b.salt = "2".to_string();
        assert_ne!(a.hash(), b.hash());
        assert!(a.hash().starts_with("0x"));
        assert_eq!(a.hash().len(), 66);
    }

    #[test]
    fn test_hash_ignores_amount_scale() {
        let a = sample_order("WETH", "DAI");
        let mut b = a.clone();
        b.maker_amount = dec!(1.000);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderState::Cancelled.is_terminal());
        assert!(OrderState::StoppedWatching.is_terminal());
        assert!(!OrderState::Added.is_terminal());
        assert!(!OrderState::FillabilityIncreased.is_terminal());
        assert_eq!(
            serde_json::to_string(&OrderState::FullyFilled).unwrap(),
            format!("\"{}\"", OrderState::FullyFilled.as_str())
        );
    }

    #[test]
    fn test_decode_complete_row() {
        let order = sample_order("WETH", "DAI");
        let row = StoredOrder::from_signed(&order, OrderState::Added);
        let decoded = RelayerOrder::try_from(row.clone()).unwrap();
        assert_eq!(decoded.order, order);
        assert_eq!(decoded.hash(), row.hash);
        assert_eq!(decoded.meta_data.remaining_fillable_taker_amount, order.taker_amount);
    }

    #[test]
    fn test_decode_missing_field_fails() {
        let order = sample_order("WETH", "DAI");
        let mut row = StoredOrder::from_signed(&order, OrderState::Added);
        row.signature = None;

        match RelayerOrder::try_from(row) {
            Err(RelayerError::Decode { field, .. }) => assert_eq!(field, "signature"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let order = sample_order("WETH", "DAI");
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("makerToken").is_some());
        assert_eq!(json["makerAmount"], "1");
    }
}
