//! Minswap V2 constant-product pools.
//!
//! Every pool lives at the pool script address and holds the pool
//! authentication asset plus the unminted remainder of its LP asset. The pool
//! state comes from the output's datum, never from its value.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::BaseDex;
use crate::config::V2Config;
use crate::kupo::DatumSource;
use crate::models::asset::{compute_lp_asset, normalize_pair};
use crate::models::{Asset, Utxo, V2PoolState};
use crate::utils::{asset_pattern, credential_pattern};

const IDENTIFIER: &str = "MinswapV2";

/// A decoded pool together with the output it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct V2Pool {
    pub out_ref: String,
    pub address: String,
    pub lp_asset: String,
    pub state: V2PoolState,
}

impl V2Pool {
    pub fn pair(&self) -> String {
        self.state.pair()
    }
}

pub struct MinswapV2<S> {
    source: S,
    config: &'static V2Config,
}

impl<S: DatumSource> MinswapV2<S> {
    pub fn new(source: S, config: &'static V2Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &'static V2Config {
        self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Outputs at the pool script address carrying the authentication asset.
    pub async fn pool_utxos(&self) -> Result<Vec<Utxo>> {
        let authen = self.config.pool_authen()?;
        let utxos = self
            .source
            .utxos_matching(&credential_pattern(self.config.pool_script_hash_bech32))
            .await?;
        Ok(utxos.into_iter().filter(|u| u.holds(&authen)).collect())
    }

    /// `Ok(None)` for outputs that are not pools, and for zap pools.
    pub async fn pool_from_utxo(&self, utxo: &Utxo) -> Result<Option<V2Pool>> {
        if !utxo.holds(&self.config.pool_authen()?) {
            return Ok(None);
        }
        let datum_hash = utxo
            .datum_hash
            .as_deref()
            .ok_or_else(|| anyhow!("pool output {} has no datum", utxo.out_ref()))?;
        let datum = self
            .source
            .datum_by_hash(datum_hash)
            .await?
            .ok_or_else(|| anyhow!("datum {} of {} not found", datum_hash, utxo.out_ref()))?;
        let state = V2PoolState::from_cbor(&datum)
            .with_context(|| format!("decoding pool datum of {}", utxo.out_ref()))?;

        let lp_policy = self.config.lp_policy_bytes()?;
        if state.is_zap_pool(&lp_policy) {
            debug!(out_ref = %utxo.out_ref(), "skipping zap pool");
            return Ok(None);
        }
        Ok(Some(V2Pool {
            out_ref: utxo.out_ref(),
            address: utxo.address.clone(),
            lp_asset: state.lp_asset(&lp_policy).identifier(""),
            state,
        }))
    }

    pub async fn all_pools(&self) -> Result<Vec<V2Pool>> {
        let utxos = self.pool_utxos().await?;
        let mut pools = Vec::with_capacity(utxos.len());
        for utxo in &utxos {
            match self.pool_from_utxo(utxo).await {
                Ok(Some(pool)) => pools.push(pool),
                Ok(None) => {}
                Err(e) => warn!(out_ref = %utxo.out_ref(), error = %format!("{:#}", e), "skipping pool output"),
            }
        }
        info!(pools = pools.len(), outputs = utxos.len(), "loaded minswap v2 pools");
        Ok(pools)
    }

    /// The pool trading `a` against `b`, in either order.
    pub async fn pool_by_pair(&self, a: Asset, b: Asset) -> Result<Option<V2Pool>> {
        let (a, b) = normalize_pair(a, b);
        let lp_asset = compute_lp_asset(&self.config.lp_policy_bytes()?, &a, &b);
        let authen = self.config.pool_authen()?;
        let utxos = self
            .source
            .utxos_matching(&asset_pattern(&lp_asset.identifier("")))
            .await?;
        for utxo in utxos.iter().filter(|u| u.holds(&authen)) {
            if let Some(pool) = self.pool_from_utxo(utxo).await? {
                if pool.state.asset_a == a && pool.state.asset_b == b {
                    return Ok(Some(pool));
                }
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<S: DatumSource> BaseDex for MinswapV2<S> {
    type Pool = V2Pool;

    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    async fn all_pools(&self) -> Result<Vec<V2Pool>> {
        MinswapV2::all_pools(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkId;
    use crate::dex::mock::MockSource;
    use crate::models::pool::tests::pool;

    const MIN: &str = "e16c2dc8ae937e8d3790c7fd7168d7b994621ba14ca11415f39fed724d494e";

    fn config() -> &'static V2Config {
        V2Config::for_network(NetworkId::Testnet)
    }

    fn pool_address() -> &'static str {
        config().pool_script_hash_bech32
    }

    fn lp_unit(state: &V2PoolState) -> String {
        state.lp_asset(&config().lp_policy_bytes().unwrap()).identifier("")
    }

    fn source_with_pool(state: &V2PoolState) -> MockSource {
        let lp = lp_unit(state);
        let mut source = MockSource::default();
        source.add(
            pool_address(),
            &[
                ("lovelace", 1_000),
                (MIN, 2_000),
                (config().pool_authen_asset, 1),
                (lp.as_str(), 9_000),
            ],
            Some(state.datum.clone()),
        );
        source
    }

    #[tokio::test]
    async fn test_all_pools_skips_broken_outputs() {
        let state = pool(1_000, 2_000, 1_414, 30, 30);
        let mut source = source_with_pool(&state);
        // Authenticated but with an undecodable datum.
        source.add(
            pool_address(),
            &[("lovelace", 5), (config().pool_authen_asset, 1)],
            Some(vec![0xd8, 0x7a, 0x80]),
        );
        // Authenticated without a datum.
        source.add(pool_address(), &[("lovelace", 5), (config().pool_authen_asset, 1)], None);
        // Not a pool.
        source.add(pool_address(), &[("lovelace", 5)], Some(state.datum.clone()));

        let dex = MinswapV2::new(source, config());
        assert_eq!(dex.pool_utxos().await.unwrap().len(), 3);
        let pools = dex.all_pools().await.unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].state, state);
        assert_eq!(pools[0].lp_asset, lp_unit(&state));
        assert_eq!(pools[0].pair(), "ADA/MIN");
    }

    #[tokio::test]
    async fn test_pool_by_pair_in_either_order() {
        let state = pool(1_000, 2_000, 1_414, 30, 30);
        let dex = MinswapV2::new(source_with_pool(&state), config());
        let min = Asset::from_identifier(MIN).unwrap();

        let found = dex.pool_by_pair(min.clone(), Asset::ada()).await.unwrap().unwrap();
        assert_eq!(found.state, state);
        let found = dex.pool_by_pair(Asset::ada(), min).await.unwrap();
        assert!(found.is_some());

        let other = Asset::new(vec![0x01; 28], b"X".to_vec());
        assert!(dex.pool_by_pair(Asset::ada(), other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zap_pools_are_not_pools() {
        let mut state = pool(1_000, 2_000, 1_414, 30, 30);
        state.asset_b = Asset::new(config().lp_policy_bytes().unwrap(), vec![0x11; 32]);
        state.datum = state.to_cbor();
        let dex = MinswapV2::new(source_with_pool(&state), config());
        let utxo = dex.pool_utxos().await.unwrap().remove(0);
        assert!(dex.pool_from_utxo(&utxo).await.unwrap().is_none());
        assert!(BaseDex::all_pools(&dex).await.unwrap().is_empty());
    }
}
