//! Minswap stable pools (Curve-style invariant).
//!
//! Stable pools are not discoverable from chain data alone: each deployment
//! is listed in [`StableConfig`] and located through its pool NFT. Balances
//! are read from the datum, not from the output value.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use super::BaseDex;
use crate::config::{NetworkId, StableConfig};
use crate::kupo::DatumSource;
use crate::models::{Asset, StablePool, StablePoolState};
use crate::utils::asset_pattern;

const IDENTIFIER: &str = "MinswapStable";

pub struct MinswapStable<S> {
    source: S,
    network: NetworkId,
}

impl<S: DatumSource> MinswapStable<S> {
    pub fn new(source: S, network: NetworkId) -> Self {
        Self { source, network }
    }

    /// Current state of one deployment.
    pub async fn pool(&self, config: &StableConfig) -> Result<StablePool> {
        let nft = Asset::from_identifier(config.nft_asset)?;
        let utxos = self.source.utxos_matching(&asset_pattern(config.nft_asset)).await?;
        let utxo = utxos
            .into_iter()
            .find(|u| u.address == config.pool_address && u.holds(&nft))
            .ok_or_else(|| anyhow!("no output at {} holds the pool NFT", config.pool_address))?;

        let datum_hash = utxo
            .datum_hash
            .as_deref()
            .ok_or_else(|| anyhow!("stable pool output {} has no datum", utxo.out_ref()))?;
        let datum = self
            .source
            .datum_by_hash(datum_hash)
            .await?
            .ok_or_else(|| anyhow!("datum {} of {} not found", datum_hash, utxo.out_ref()))?;

        // ── Datum parsing ──
        let state = StablePoolState::from_cbor(&datum)
            .with_context(|| format!("decoding stable pool datum of {}", utxo.out_ref()))?;
        Ok(StablePool::new(config, state)?)
    }

    /// Deployment matching a pool NFT, LP asset or pool address.
    pub async fn pool_by_id(&self, identifier: &str) -> Result<StablePool> {
        let config = StableConfig::find(self.network, identifier)
            .ok_or_else(|| anyhow!("unknown stable pool {} on {}", identifier, self.network))?;
        self.pool(config).await
    }

    pub async fn all_pools(&self) -> Result<Vec<StablePool>> {
        let configs = StableConfig::for_network(self.network);
        let mut pools = Vec::with_capacity(configs.len());
        for config in configs {
            match self.pool(config).await {
                Ok(pool) => pools.push(pool),
                Err(e) => warn!(pool = config.pool_address, error = %format!("{:#}", e), "skipping stable pool"),
            }
        }
        info!(pools = pools.len(), deployments = configs.len(), "loaded minswap stable pools");
        Ok(pools)
    }
}

#[async_trait]
impl<S: DatumSource> BaseDex for MinswapStable<S> {
    type Pool = StablePool;

    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    async fn all_pools(&self) -> Result<Vec<StablePool>> {
        MinswapStable::all_pools(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::mock::MockSource;
    use crate::models::stable_pool::encode_stable_pool;
    use num_bigint::BigUint;

    fn datum(balances: &[u64]) -> Vec<u8> {
        encode_stable_pool(&StablePoolState {
            balances: balances.iter().map(|b| BigUint::from(*b)).collect(),
            total_liquidity: BigUint::from(balances.iter().sum::<u64>()),
            amplification_coefficient: BigUint::from(200u32),
            order_hash: vec![0x2a; 28],
            datum: Vec::new(),
        })
        .to_cbor()
    }

    #[tokio::test]
    async fn test_stable_pool_from_nft() {
        let configs = StableConfig::for_network(NetworkId::Testnet);
        let config = &configs[0];
        let mut source = MockSource::default();
        // Same NFT at a foreign address must be ignored.
        source.add("addr_test1foreign", &[(config.nft_asset, 1)], Some(datum(&[1, 1])));
        source.add(
            config.pool_address,
            &[("lovelace", 2_000_000), (config.nft_asset, 1)],
            Some(datum(&[1_000_000, 1_200_000])),
        );

        let dex = MinswapStable::new(source, NetworkId::Testnet);
        let pool = dex.pool_by_id(config.lp_asset).await.unwrap();
        assert_eq!(pool.state.balances[1], BigUint::from(1_200_000u32));
        assert_eq!(pool.address, config.pool_address);
        assert!(dex.pool_by_id("00").await.is_err());

        assert_eq!(BaseDex::identifier(&dex), "MinswapStable");
        // Only the first deployment is on chain; the rest are skipped.
        let pools = BaseDex::all_pools(&dex).await.unwrap();
        assert_eq!(pools.len(), 1);
    }

    #[tokio::test]
    async fn test_balance_count_must_match_deployment() {
        let config = &StableConfig::for_network(NetworkId::Testnet)[0];
        let mut source = MockSource::default();
        source.add(config.pool_address, &[(config.nft_asset, 1)], Some(datum(&[1, 2, 3, 4, 5])));
        let err = MinswapStable::new(source, NetworkId::Testnet).pool(config).await.unwrap_err();
        assert!(format!("{:#}", err).contains("StablePoolState[0]"));
    }
}
