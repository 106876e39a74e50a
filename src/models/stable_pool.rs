use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::config::StableConfig;
use crate::error::{Error, Result};
use crate::models::Asset;
use crate::plutus::{constr_tag, PlutusData, ToPlutusData};

/// Datum of a stable-swap pool.
///
/// Balances are read from the datum, not from the UTXO value: the UTXO also
/// holds accrued admin fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablePoolState {
    #[serde(with = "crate::models::quantity::vec")]
    pub balances: Vec<BigUint>,
    /// The D invariant.
    #[serde(with = "crate::models::quantity")]
    pub total_liquidity: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub amplification_coefficient: BigUint,
    #[serde(with = "hex::serde")]
    pub order_hash: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub datum: Vec<u8>,
}

impl StablePoolState {
    pub fn from_cbor(bytes: &[u8]) -> Result<StablePoolState> {
        let mut state = decode_stable_pool(&PlutusData::from_cbor(bytes)?)?;
        state.datum = bytes.to_vec();
        Ok(state)
    }
}

pub fn encode_stable_pool(state: &StablePoolState) -> PlutusData {
    PlutusData::constr(
        0,
        vec![
            PlutusData::list(state.balances.iter().map(ToPlutusData::to_pd).collect()),
            state.total_liquidity.to_pd(),
            state.amplification_coefficient.to_pd(),
            PlutusData::bytes(state.order_hash.clone()),
        ],
    )
}

pub fn decode_stable_pool(data: &PlutusData) -> Result<StablePoolState> {
    let (alternative, f) = data.fields("StablePoolState")?;
    if alternative != 0 {
        return Err(Error::WrongPoolTag { tag: constr_tag(alternative) });
    }
    f.expect_len(4)?;
    let balances = f
        .list(0)?
        .iter()
        .enumerate()
        .map(|(i, balance)| {
            balance.as_int().cloned().ok_or_else(|| {
                Error::shape(format!("StablePoolState[0][{}]", i), "int", balance.kind())
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(StablePoolState {
        balances,
        total_liquidity: f.int(1)?,
        amplification_coefficient: f.int(2)?,
        order_hash: f.bytes(3)?,
        datum: data.to_cbor(),
    })
}

/// A stable pool: its deployment parameters plus the state read on chain.
#[derive(Debug, Clone, Serialize)]
pub struct StablePool {
    pub address: String,
    pub nft_asset: String,
    pub lp_asset: String,
    pub assets: Vec<Asset>,
    pub multiples: Vec<u64>,
    pub fee: u64,
    pub admin_fee: u64,
    pub fee_denominator: u64,
    pub state: StablePoolState,
}

impl StablePool {
    pub fn new(config: &StableConfig, state: StablePoolState) -> Result<Self> {
        let assets = config.assets()?;
        if state.balances.len() != assets.len() {
            return Err(Error::shape(
                "StablePoolState[0]",
                format!("{} balances", assets.len()),
                format!("{} balances", state.balances.len()),
            ));
        }
        Ok(Self {
            address: config.pool_address.to_string(),
            nft_asset: config.nft_asset.to_string(),
            lp_asset: config.lp_asset.to_string(),
            assets,
            multiples: config.multiples.to_vec(),
            fee: config.fee,
            admin_fee: config.admin_fee,
            fee_denominator: config.fee_denominator,
            state,
        })
    }

    pub fn pair(&self) -> String {
        self.assets
            .iter()
            .map(Asset::ticker)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Marginal price of asset `j` in units of asset `i`, from the derivative
    /// of the StableSwap invariant:
    ///
    ///   P = (y/x) * (1 + A*x/D) / (1 + A*y/D)
    ///
    /// with x, y the balances scaled by their multiples.
    pub fn price(&self, i: usize, j: usize) -> Result<BigRational> {
        let scaled = |k: usize| -> Result<BigRational> {
            let balance = self
                .state
                .balances
                .get(k)
                .ok_or_else(|| Error::precondition(format!("no asset at index {}", k)))?;
            let multiple = self.multiples.get(k).copied().unwrap_or(1);
            Ok(BigRational::from_integer(BigInt::from(balance * multiple)))
        };
        let x = scaled(i)?;
        let y = scaled(j)?;
        let d = BigRational::from_integer(BigInt::from(self.state.total_liquidity.clone()));
        let a = BigRational::from_integer(BigInt::from(self.state.amplification_coefficient.clone()));
        if x.is_zero() || d.is_zero() {
            return Err(Error::precondition("price of an empty stable pool"));
        }
        let one = BigRational::from_integer(BigInt::from(1));
        Ok((&y / &x) * ((&one + &a * &x / &d) / (&one + &a * &y / &d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkId;

    fn state(balances: &[u64]) -> StablePoolState {
        let mut s = StablePoolState {
            balances: balances.iter().map(|b| BigUint::from(*b)).collect(),
            total_liquidity: BigUint::from(balances.iter().sum::<u64>()),
            amplification_coefficient: BigUint::from(10u32),
            order_hash: vec![0x1f; 28],
            datum: Vec::new(),
        };
        s.datum = encode_stable_pool(&s).to_cbor();
        s
    }

    #[test]
    fn test_stable_state_roundtrip() {
        let s = state(&[1_000, 2_000, 3_000]);
        assert_eq!(StablePoolState::from_cbor(&s.datum).unwrap(), s);
    }

    #[test]
    fn test_stable_state_errors() {
        let pd = PlutusData::constr(
            0,
            vec![
                PlutusData::list(vec![PlutusData::int(1u32), PlutusData::bytes(vec![])]),
                PlutusData::int(1u32),
                PlutusData::int(1u32),
                PlutusData::bytes(vec![]),
            ],
        );
        assert_eq!(decode_stable_pool(&pd).unwrap_err().field(), Some("StablePoolState[0][1]"));
        assert_eq!(
            decode_stable_pool(&PlutusData::unit(1)).unwrap_err(),
            Error::WrongPoolTag { tag: 122 }
        );
    }

    #[test]
    fn test_balanced_pool_prices_at_par() {
        let config = &StableConfig::for_network(NetworkId::Testnet)[0];
        let pool = StablePool::new(config, state(&[5_000, 5_000])).unwrap();
        assert_eq!(pool.price(0, 1).unwrap(), BigRational::from_integer(BigInt::from(1)));
        assert!(pool.price(0, 7).is_err());
        assert!(StablePool::new(config, state(&[1, 2, 3])).is_err());
    }
}
