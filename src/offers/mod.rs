//! Liquidity offer matching
//!
//! Offers are few compared to orders, so listing is a full scan of one
//! collection followed by an in-memory filter.

mod registry;
mod service;

pub use registry::{HttpPoolRegistry, PoolParameters, PoolRegistry};
pub use service::OfferService;

#[cfg(test)]
pub use registry::MockPoolRegistry;

use serde::Deserialize;

use crate::config::NULL_ADDRESS;
use crate::offer::{AddLiquidityOffer, CreatePoolOffer, RemoveLiquidityOffer};

/// Filterable attributes shared by every offer kind
pub trait OfferAttributes {
    fn maker(&self) -> &str;
    fn taker(&self) -> &str;
    fn maker_direction(&self) -> &str;
    fn reference_asset(&self) -> &str;
    fn collateral_token(&self) -> &str;
    fn data_provider(&self) -> &str;
    fn permissioned_token(&self) -> &str;

    /// `None` for offers that do not target an existing pool
    fn pool_id(&self) -> Option<&str>;
}

macro_rules! impl_offer_attributes {
    ($offer:ty, |$this:ident| $pool_id:expr) => {
        impl OfferAttributes for $offer {
            fn maker(&self) -> &str {
                &self.maker
            }
            fn taker(&self) -> &str {
                &self.taker
            }
            fn maker_direction(&self) -> &str {
                &self.maker_direction
            }
            fn reference_asset(&self) -> &str {
                &self.reference_asset
            }
            fn collateral_token(&self) -> &str {
                &self.collateral_token
            }
            fn data_provider(&self) -> &str {
                &self.data_provider
            }
            fn permissioned_token(&self) -> &str {
                &self.permissioned_token
            }
            fn pool_id(&self) -> Option<&str> {
                let $this = self;
                $pool_id
            }
        }
    };
}

impl_offer_attributes!(CreatePoolOffer, |_offer| None);
impl_offer_attributes!(AddLiquidityOffer, |offer| Some(offer.pool_id.as_str()));
impl_offer_attributes!(RemoveLiquidityOffer, |offer| Some(offer.pool_id.as_str()));

/// Conjunction of optional equality predicates over offer attributes
///
/// Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferFilter {
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

fn address_matches(expected: &Option<String>, actual: &str) -> bool {
    expected
        .as_deref()
        .map_or(true, |expected| expected.eq_ignore_ascii_case(actual))
}

fn text_matches(expected: &Option<String>, actual: &str) -> bool {
    expected.as_deref().map_or(true, |expected| expected == actual)
}

impl OfferFilter {
    /// Treat the null address and empty text as "unset", as older clients
    /// send them for every field they do not filter on
    pub fn without_legacy_sentinels(self) -> Self {
        let address = |value: Option<String>| {
            value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(NULL_ADDRESS))
        };
        let text = |value: Option<String>| value.filter(|v| !v.is_empty());

        Self {
            maker: address(self.maker),
            taker: address(self.taker),
            maker_direction: text(self.maker_direction),
            reference_asset: text(self.reference_asset),
            collateral_token: address(self.collateral_token),
            data_provider: address(self.data_provider),
            permissioned_token: address(self.permissioned_token),
            pool_id: text(self.pool_id),
        }
    }

    pub fn matches<O: OfferAttributes>(&self, offer: &O) -> bool {
        address_matches(&self.maker, offer.maker())
            && address_matches(&self.taker, offer.taker())
            && text_matches(&self.maker_direction, offer.maker_direction())
            && text_matches(&self.reference_asset, offer.reference_asset())
            && address_matches(&self.collateral_token, offer.collateral_token())
            && address_matches(&self.data_provider, offer.data_provider())
            && address_matches(&self.permissioned_token, offer.permissioned_token())
            && match (&self.pool_id, offer.pool_id()) {
                (None, _) => true,
                (Some(expected), Some(actual)) => expected == actual,
                (Some(_), None) => false,
            }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn add_liquidity_offer(offer_hash: &str, pool_id: &str) -> AddLiquidityOffer {
        AddLiquidityOffer {
            offer_hash: offer_hash.to_string(),
            maker: "0x9AdEFeb576dcF52F5220709c1B267d89d5208D78".to_string(),
            taker: NULL_ADDRESS.to_string(),
            maker_collateral_amount: "3000000000000000000".to_string(),
            taker_collateral_amount: "7000000000000000000".to_string(),
            maker_direction: "true".to_string(),
            offer_expiry: "1665587500".to_string(),
            minimum_taker_fill_amount: "1000000000000000000".to_string(),
            pool_id: pool_id.to_string(),
            salt: "1665501187956".to_string(),
            signature: "{}".to_string(),
            chain_id: 5,
            verifying_contract: "0x6cDEc9b70431bf650f3A0DDD0e246368a4C4F1E1".to_string(),
            reference_asset: "ETH/USD".to_string(),
            collateral_token: "0xFA158347cd9b4A1f1F5a3Dfa1A8D2F6a9eA5a52b".to_string(),
            data_provider: "0x245B8ABbC1B70B370d1b81398dE0a7920B25E7ca".to_string(),
            permissioned_token: NULL_ADDRESS.to_string(),
        }
    }

    pub(crate) fn create_pool_offer(offer_hash: &str) -> CreatePoolOffer {
        CreatePoolOffer {
            offer_hash: offer_hash.to_string(),
            maker: "0x9AdEFeb576dcF52F5220709c1B267d89d5208D78".to_string(),
            taker: NULL_ADDRESS.to_string(),
            maker_collateral_amount: "3000000000000000000".to_string(),
            taker_collateral_amount: "7000000000000000000".to_string(),
            maker_direction: "false".to_string(),
            offer_expiry: "1665587500".to_string(),
            minimum_taker_fill_amount: "1000000000000000000".to_string(),
            reference_asset: "BTC/USD".to_string(),
            expiry_time: "1666000000".to_string(),
            floor: "20000000000000000000000".to_string(),
            inflection: "25000000000000000000000".to_string(),
            cap: "30000000000000000000000".to_string(),
            gradient: "500000000000000000".to_string(),
            collateral_token: "0xFA158347cd9b4A1f1F5a3Dfa1A8D2F6a9eA5a52b".to_string(),
            data_provider: "0x245B8ABbC1B70B370d1b81398dE0a7920B25E7ca".to_string(),
            capacity: "100000000000000000000".to_string(),
            permissioned_token: NULL_ADDRESS.to_string(),
            salt: "1665501187956".to_string(),
            signature: "{}".to_string(),
            chain_id: 5,
            verifying_contract: "0x6cDEc9b70431bf650f3A0DDD0e246368a4C4F1E1".to_string(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = OfferFilter::default();
        assert!(filter.matches(&add_liquidity_offer("0x1", "24")));
        assert!(filter.matches(&create_pool_offer("0x2")));
    }

    #[test]
    fn test_addresses_compare_case_insensitively() {
        let filter = OfferFilter {
            maker: Some("0x9adefeb576dcf52f5220709c1b267d89d5208d78".to_string()),
            collateral_token: Some("0xFA158347CD9B4A1F1F5A3DFA1A8D2F6A9EA5A52B".to_string()),
            ..OfferFilter::default()
        };
        assert!(filter.matches(&add_liquidity_offer("0x1", "24")));

        let wrong_case_asset = OfferFilter {
            reference_asset: Some("eth/usd".to_string()),
            ..OfferFilter::default()
        };
        assert!(!wrong_case_asset.matches(&add_liquidity_offer("0x1", "24")));
    }

    #[test]
    fn test_predicates_are_conjunctive() {
        let offer = add_liquidity_offer("0x1", "24");
        let both = OfferFilter {
            maker_direction: Some("true".to_string()),
            pool_id: Some("24".to_string()),
            ..OfferFilter::default()
        };
        assert!(both.matches(&offer));

        let one_wrong = OfferFilter {
            pool_id: Some("25".to_string()),
            ..both
        };
        assert!(!one_wrong.matches(&offer));
    }

    #[test]
    fn test_pool_id_never_matches_create_pool_offers() {
        let filter = OfferFilter {
            pool_id: Some("24".to_string()),
            ..OfferFilter::default()
        };
        assert!(!filter.matches(&create_pool_offer("0x2")));
    }

    #[test]
    fn test_legacy_sentinels_become_unset() {
        let legacy = OfferFilter {
            maker: Some(NULL_ADDRESS.to_string()),
            taker: Some("".to_string()),
            maker_direction: Some("".to_string()),
            reference_asset: Some("ETH/USD".to_string()),
            collateral_token: None,
            data_provider: Some(NULL_ADDRESS.to_uppercase()),
            permissioned_token: Some(NULL_ADDRESS.to_string()),
            pool_id: Some("".to_string()),
        }
        .without_legacy_sentinels();

        assert_eq!(
            legacy,
            OfferFilter {
                reference_asset: Some("ETH/USD".to_string()),
                ..OfferFilter::default()
            }
        );
    }
}
