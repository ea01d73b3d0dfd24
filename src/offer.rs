//! Liquidity offer shapes
//!
//! Amount-like fields are uint256 values carried as decimal text; the relayer
//! stores and filters offers but never does arithmetic on them.

use serde::{Deserialize, Serialize};

/// The three offer collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfferKind {
    CreatePool,
    AddLiquidity,
    RemoveLiquidity,
}

impl std::str::FromStr for OfferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createPool" => Ok(OfferKind::CreatePool),
            "addLiquidity" => Ok(OfferKind::AddLiquidity),
            "removeLiquidity" => Ok(OfferKind::RemoveLiquidity),
            other => Err(format!("unknown offer kind: {}", other)),
        }
    }
}

/// Signed offer to create a new contingent pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolOffer {
    pub offer_hash: String,
    pub maker: String,
    pub taker: String,
    pub maker_collateral_amount: String,
    pub taker_collateral_amount: String,
    pub maker_direction: String,
    pub offer_expiry: String,
    pub minimum_taker_fill_amount: String,
    pub reference_asset: String,
    pub expiry_time: String,
    pub floor: String,
    pub inflection: String,
    pub cap: String,
    pub gradient: String,
    pub collateral_token: String,
    pub data_provider: String,
    pub capacity: String,
    #[serde(rename = "permissionedERC721Token")]
    pub permissioned_token: String,
    pub salt: String,
    pub signature: String,
    pub chain_id: u64,
    pub verifying_contract: String,
}

/// Signed offer to add collateral to an existing pool
///
/// `reference_asset`, `collateral_token` and `data_provider` are overwritten
/// from the pool registry on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidityOffer {
    pub offer_hash: String,
    pub maker: String,
    pub taker: String,
    pub maker_collateral_amount: String,
    pub taker_collateral_amount: String,
    pub maker_direction: String,
    pub offer_expiry: String,
    pub minimum_taker_fill_amount: String,
    pub pool_id: String,
    pub salt: String,
    pub signature: String,
    pub chain_id: u64,
    pub verifying_contract: String,
    #[serde(default)]
    pub reference_asset: String,
    #[serde(default)]
    pub collateral_token: String,
    #[serde(default)]
    pub data_provider: String,
    #[serde(default, rename = "permissionedERC721Token")]
    pub permissioned_token: String,
}

/// Signed offer to remove collateral from an existing pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLiquidityOffer {
    pub offer_hash: String,
    pub maker: String,
    pub taker: String,
    pub position_token_amount: String,
    pub maker_collateral_amount: String,
    pub maker_direction: String,
    pub offer_expiry: String,
    pub minimum_taker_fill_amount: String,
    pub pool_id: String,
    pub salt: String,
    pub signature: String,
    pub chain_id: u64,
    pub verifying_contract: String,
    pub reference_asset: String,
    pub collateral_token: String,
    pub data_provider: String,
    #[serde(rename = "permissionedERC721Token")]
    pub permissioned_token: String,
}

/// Body of `POST /offer`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubmittedOffer {
    CreatePool(CreatePoolOffer),
    AddLiquidity(AddLiquidityOffer),
    RemoveLiquidity(RemoveLiquidityOffer),
}

impl SubmittedOffer {
    pub fn kind(&self) -> OfferKind {
        match self {
            SubmittedOffer::CreatePool(_) => OfferKind::CreatePool,
            SubmittedOffer::AddLiquidity(_) => OfferKind::AddLiquidity,
            SubmittedOffer::RemoveLiquidity(_) => OfferKind::RemoveLiquidity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_kind_round_trips_wire_name() {
        for kind in [
            OfferKind::CreatePool,
            OfferKind::AddLiquidity,
            OfferKind::RemoveLiquidity,
        ] {
            let wire = serde_json::to_string(&kind).unwrap();
            let parsed: OfferKind = wire.trim_matches('"').parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("pool".parse::<OfferKind>().is_err());
    }

    #[test]
    fn test_submitted_offer_is_tagged_by_kind() {
        let raw = r#"{
            "kind": "addLiquidity",
            "offerHash": "0xa8a5",
            "maker": "0x9AdEFeb576dcF52F5220709c1B267d89d5208D78",
            "taker": "0x0000000000000000000000000000000000000000",
            "makerCollateralAmount": "3000000000000000000",
            "takerCollateralAmount": "7000000000000000000",
            "makerDirection": "true",
            "offerExpiry": "1665587500",
            "minimumTakerFillAmount": "1000000000000000000",
            "poolId": "24",
            "salt": "1665501187956",
            "signature": "{}",
            "chainId": 5,
            "verifyingContract": "0x6cDEc9b70431bf650f3A0DDD0e246368a4C4F1E1"
        }"#;

        let offer: SubmittedOffer = serde_json::from_str(raw).unwrap();
        assert_eq!(offer.kind(), OfferKind::AddLiquidity);
        if let SubmittedOffer::AddLiquidity(offer) = offer {
            assert_eq!(offer.pool_id, "24");
            assert!(offer.reference_asset.is_empty());
        } else {
            panic!("Expected AddLiquidity");
        }
    }
}
