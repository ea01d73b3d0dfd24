//! Pool registry client
//!
//! The registry is the on-chain source of truth for the identifying
//! attributes of an existing pool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RelayerError, Result};

/// Identifying attributes of a pool as recorded on chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolParameters {
    pub reference_asset: String,
    pub collateral_token: String,
    pub data_provider: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PoolRegistry: Send + Sync {
    async fn pool_parameters(
        &self,
        chain_id: u64,
        verifying_contract: &str,
        pool_id: &str,
    ) -> Result<PoolParameters>;
}

/// Registry lookup service reached over HTTP
pub struct HttpPoolRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPoolRegistry {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn pool_url(&self, chain_id: u64, verifying_contract: &str, pool_id: &str) -> String {
        format!(
            "{}/pools/{}/{}/{}",
            self.base_url, chain_id, verifying_contract, pool_id
        )
    }
}

#[async_trait]
impl PoolRegistry for HttpPoolRegistry {
    async fn pool_parameters(
        &self,
        chain_id: u64,
        verifying_contract: &str,
        pool_id: &str,
    ) -> Result<PoolParameters> {
        let url = self.pool_url(chain_id, verifying_contract, pool_id);
        debug!(url = %url, "Fetching pool parameters");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RelayerError::Registry(format!("Failed to reach pool registry: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayerError::Registry(format!(
                "Pool registry returned {} for pool {}",
                status, pool_id
            )));
        }

        response
            .json::<PoolParameters>()
            .await
            .map_err(|e| RelayerError::Registry(format!("Invalid pool parameters: {}", e)))
    }
}
