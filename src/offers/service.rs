//! Offer service

use std::sync::Arc;
use tracing::info;

use super::{OfferAttributes, OfferFilter, PoolRegistry};
use crate::error::Result;
use crate::offer::{AddLiquidityOffer, CreatePoolOffer, RemoveLiquidityOffer, SubmittedOffer};
use crate::pagination::{paginate, PaginatedCollection};
use crate::store::{OfferRecord, OfferRepository};

/// Lists, looks up and stores liquidity offers of every kind
pub struct OfferService {
    create_pool: Arc<dyn OfferRepository<CreatePoolOffer>>,
    add_liquidity: Arc<dyn OfferRepository<AddLiquidityOffer>>,
    remove_liquidity: Arc<dyn OfferRepository<RemoveLiquidityOffer>>,
    registry: Arc<dyn PoolRegistry>,
}

async fn list<T>(
    repository: &dyn OfferRepository<T>,
    filter: &OfferFilter,
    page: usize,
    per_page: usize,
) -> Result<PaginatedCollection<T>>
where
    T: OfferRecord + OfferAttributes,
{
    let matching = repository
        .all()
        .await?
        .into_iter()
        .filter(|offer| filter.matches(offer))
        .collect();
    Ok(paginate(matching, page, per_page))
}

impl OfferService {
    pub fn new(
        create_pool: Arc<dyn OfferRepository<CreatePoolOffer>>,
        add_liquidity: Arc<dyn OfferRepository<AddLiquidityOffer>>,
        remove_liquidity: Arc<dyn OfferRepository<RemoveLiquidityOffer>>,
        registry: Arc<dyn PoolRegistry>,
    ) -> Self {
        Self {
            create_pool,
            add_liquidity,
            remove_liquidity,
            registry,
        }
    }

    pub async fn list_create_pool_offers(
        &self,
        filter: &OfferFilter,
        page: usize,
        per_page: usize,
    ) -> Result<PaginatedCollection<CreatePoolOffer>> {
        list(self.create_pool.as_ref(), filter, page, per_page).await
    }

    pub async fn list_add_liquidity_offers(
        &self,
        filter: &OfferFilter,
        page: usize,
        per_page: usize,
    ) -> Result<PaginatedCollection<AddLiquidityOffer>> {
        list(self.add_liquidity.as_ref(), filter, page, per_page).await
    }

    pub async fn list_remove_liquidity_offers(
        &self,
        filter: &OfferFilter,
        page: usize,
        per_page: usize,
    ) -> Result<PaginatedCollection<RemoveLiquidityOffer>> {
        list(self.remove_liquidity.as_ref(), filter, page, per_page).await
    }

    pub async fn get_create_pool_offer(&self, offer_hash: &str) -> Result<Option<CreatePoolOffer>> {
        self.create_pool.find_by_hash(offer_hash).await
    }

    pub async fn get_add_liquidity_offer(
        &self,
        offer_hash: &str,
    ) -> Result<Option<AddLiquidityOffer>> {
        self.add_liquidity.find_by_hash(offer_hash).await
    }

    pub async fn get_remove_liquidity_offer(
        &self,
        offer_hash: &str,
    ) -> Result<Option<RemoveLiquidityOffer>> {
        self.remove_liquidity.find_by_hash(offer_hash).await
    }

    pub async fn submit_create_pool_offer(&self, offer: CreatePoolOffer) -> Result<String> {
        let offer_hash = offer.offer_hash.clone();
        self.create_pool.insert(offer).await?;
        info!(offer_hash = %offer_hash, "Stored create-pool offer");
        Ok(offer_hash)
    }

    /// Store an add-liquidity offer with its pool attributes taken from the
    /// registry; the submitted values for those attributes are discarded
    pub async fn submit_add_liquidity_offer(&self, mut offer: AddLiquidityOffer) -> Result<String> {
        let params = self
            .registry
            .pool_parameters(offer.chain_id, &offer.verifying_contract, &offer.pool_id)
            .await?;

        offer.reference_asset = params.reference_asset;
        offer.collateral_token = params.collateral_token;
        offer.data_provider = params.data_provider;

        let offer_hash = offer.offer_hash.clone();
        let pool_id = offer.pool_id.clone();
        self.add_liquidity.insert(offer).await?;
        info!(offer_hash = %offer_hash, pool_id = %pool_id, "Stored add-liquidity offer");
        Ok(offer_hash)
    }

    pub async fn submit_remove_liquidity_offer(&self, offer: RemoveLiquidityOffer) -> Result<String> {
        let offer_hash = offer.offer_hash.clone();
        self.remove_liquidity.insert(offer).await?;
        info!(offer_hash = %offer_hash, "Stored remove-liquidity offer");
        Ok(offer_hash)
    }

    pub async fn submit(&self, offer: SubmittedOffer) -> Result<String> {
        match offer {
            SubmittedOffer::CreatePool(offer) => self.submit_create_pool_offer(offer).await,
            SubmittedOffer::AddLiquidity(offer) => self.submit_add_liquidity_offer(offer).await,
            SubmittedOffer::RemoveLiquidity(offer) => self.submit_remove_liquidity_offer(offer).await,
        }
    }
}
