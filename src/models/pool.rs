use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::address::StakeReference;
use crate::models::asset::{compute_lp_asset, Asset};
use crate::plutus::{constr_tag, PlutusData, ToPlutusData};

/// State of a constant-product V2 pool, as held in its datum.
///
/// Field order on the wire: batching stake credential, asset A, asset B,
/// total liquidity, reserve A, reserve B, base fee numerator A, base fee
/// numerator B, fee sharing option, dynamic fee flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2PoolState {
    pub pool_batching_credential: StakeReference,
    pub asset_a: Asset,
    pub asset_b: Asset,
    #[serde(with = "crate::models::quantity")]
    pub total_liquidity: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub reserve_a: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub reserve_b: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub base_fee_a_numerator: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub base_fee_b_numerator: BigUint,
    /// Share of the trading fee kept by the protocol, over the fee denominator.
    #[serde(default, with = "crate::models::quantity::option")]
    pub fee_sharing_numerator: Option<BigUint>,
    pub allow_dynamic_fee: bool,
    /// Datum bytes this state was decoded from.
    #[serde(with = "hex::serde")]
    pub datum: Vec<u8>,
}

impl V2PoolState {
    pub fn from_cbor(bytes: &[u8]) -> Result<V2PoolState> {
        let mut state = decode_pool(&PlutusData::from_cbor(bytes)?)?;
        state.datum = bytes.to_vec();
        Ok(state)
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        encode_pool(self).to_cbor()
    }

    pub fn pair(&self) -> String {
        format!("{}/{}", self.asset_a.ticker(), self.asset_b.ticker())
    }

    /// Spot price of B in units of A: `reserve_a / reserve_b`.
    pub fn price(&self) -> Result<BigRational> {
        if self.reserve_b.is_zero() {
            return Err(Error::precondition("price of a pool with no asset B reserve"));
        }
        Ok(BigRational::new(
            BigInt::from(self.reserve_a.clone()),
            BigInt::from(self.reserve_b.clone()),
        ))
    }

    /// Zap pools pair an asset with an LP token of another pool.
    pub fn is_zap_pool(&self, lp_policy_id: &[u8]) -> bool {
        self.asset_b.policy_id == lp_policy_id
    }

    pub fn lp_asset(&self, lp_policy_id: &[u8]) -> Asset {
        compute_lp_asset(lp_policy_id, &self.asset_a, &self.asset_b)
    }
}

pub fn encode_pool(state: &V2PoolState) -> PlutusData {
    let fee_sharing = match &state.fee_sharing_numerator {
        Some(numerator) => PlutusData::constr(0, vec![numerator.to_pd()]),
        None => PlutusData::unit(1),
    };
    PlutusData::constr(
        0,
        vec![
            state.pool_batching_credential.to_pd(),
            state.asset_a.to_pd(),
            state.asset_b.to_pd(),
            state.total_liquidity.to_pd(),
            state.reserve_a.to_pd(),
            state.reserve_b.to_pd(),
            state.base_fee_a_numerator.to_pd(),
            state.base_fee_b_numerator.to_pd(),
            fee_sharing,
            PlutusData::unit(u64::from(state.allow_dynamic_fee)),
        ],
    )
}

/// Decode a pool datum. `datum` is filled with the canonical encoding of
/// `data`; [`V2PoolState::from_cbor`] keeps the original bytes instead.
pub fn decode_pool(data: &PlutusData) -> Result<V2PoolState> {
    let (alternative, f) = data.fields("V2PoolState")?;
    if alternative != 0 {
        return Err(Error::WrongPoolTag { tag: constr_tag(alternative) });
    }
    f.expect_len(10)?;

    let pool_batching_credential = f.decode(0)?;
    let asset_a = f.decode(1)?;
    let asset_b = f.decode(2)?;
    let total_liquidity = f.int(3)?;
    let reserve_a = f.int(4)?;
    let reserve_b = f.int(5)?;
    let base_fee_a_numerator = f.int(6)?;
    let base_fee_b_numerator = f.int(7)?;
    // Only alternative 0 (Just) carries a numerator; anything else is Nothing.
    let fee_sharing_numerator = f.decode_with(8, |opt| {
        let (alternative, inner) = opt.fields("FeeSharing")?;
        if alternative == 0 {
            inner.int(0).map(Some)
        } else {
            Ok(None)
        }
    })?;
    let allow_dynamic_fee = f.decode_with(9, |flag| {
        let (alternative, _) = flag.fields("DynamicFee")?;
        Ok(alternative == 1)
    })?;

    Ok(V2PoolState {
        pool_batching_credential,
        asset_a,
        asset_b,
        total_liquidity,
        reserve_a,
        reserve_b,
        base_fee_a_numerator,
        base_fee_b_numerator,
        fee_sharing_numerator,
        allow_dynamic_fee,
        datum: data.to_cbor(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::address::{Credential, Pointer};
    use proptest::prelude::*;

    pub(crate) fn pool(reserve_a: u64, reserve_b: u64, liquidity: u64, fee_a: u64, fee_b: u64) -> V2PoolState {
        let mut state = V2PoolState {
            pool_batching_credential: StakeReference::Inline(Credential::Script(vec![0x7c; 28])),
            asset_a: Asset::ada(),
            asset_b: Asset::from_identifier(
                "e16c2dc8ae937e8d3790c7fd7168d7b994621ba14ca11415f39fed724d494e",
            )
            .unwrap(),
            total_liquidity: BigUint::from(liquidity),
            reserve_a: BigUint::from(reserve_a),
            reserve_b: BigUint::from(reserve_b),
            base_fee_a_numerator: BigUint::from(fee_a),
            base_fee_b_numerator: BigUint::from(fee_b),
            fee_sharing_numerator: None,
            allow_dynamic_fee: false,
            datum: Vec::new(),
        };
        state.datum = state.to_cbor();
        state
    }

    fn big() -> impl Strategy<Value = BigUint> {
        proptest::collection::vec(any::<u32>(), 0..4).prop_map(BigUint::new)
    }

    fn asset() -> impl Strategy<Value = Asset> {
        prop_oneof![
            Just(Asset::ada()),
            (
                proptest::collection::vec(any::<u8>(), 28),
                proptest::collection::vec(any::<u8>(), 0..=32),
            )
                .prop_map(|(policy, name)| Asset::new(policy, name)),
        ]
    }

    fn batching_credential() -> impl Strategy<Value = StakeReference> {
        prop_oneof![
            (any::<bool>(), proptest::collection::vec(any::<u8>(), 28)).prop_map(|(script, hash)| {
                StakeReference::Inline(if script { Credential::Script(hash) } else { Credential::Key(hash) })
            }),
            (any::<u64>(), any::<u64>(), any::<u64>()).prop_map(|(slot, tx_index, cert_index)| {
                StakeReference::Pointer(Pointer { slot, tx_index, cert_index })
            }),
        ]
    }

    fn arb_state() -> impl Strategy<Value = V2PoolState> {
        (
            batching_credential(),
            asset(),
            asset(),
            (big(), big(), big(), big(), big()),
            proptest::option::of(big()),
            any::<bool>(),
        )
            .prop_map(|(credential, asset_a, asset_b, (liquidity, ra, rb, fee_a, fee_b), sharing, dynamic)| {
                let mut state = V2PoolState {
                    pool_batching_credential: credential,
                    asset_a,
                    asset_b,
                    total_liquidity: liquidity,
                    reserve_a: ra,
                    reserve_b: rb,
                    base_fee_a_numerator: fee_a,
                    base_fee_b_numerator: fee_b,
                    fee_sharing_numerator: sharing,
                    allow_dynamic_fee: dynamic,
                    datum: Vec::new(),
                };
                state.datum = state.to_cbor();
                state
            })
    }

    proptest! {
        #[test]
        fn prop_pool_roundtrips(state in arb_state()) {
            prop_assert_eq!(V2PoolState::from_cbor(&state.datum).unwrap(), state.clone());
            prop_assert_eq!(decode_pool(&encode_pool(&state)).unwrap(), state);
        }
    }

    #[test]
    fn test_pool_json_amounts_are_decimal() {
        let mut state = pool(1_000_000_000_000, 61_636_867_016, 7_850_000_000, 30, 30);
        state.fee_sharing_numerator = Some(BigUint::from(1666u32));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["reserve_a"], "1000000000000");
        assert_eq!(json["reserve_b"], "61636867016");
        assert_eq!(json["total_liquidity"], "7850000000");
        assert_eq!(json["fee_sharing_numerator"], "1666");
        let back: V2PoolState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_pool_roundtrip_keeps_datum() {
        let mut state = pool(1_000_000, 2_000_000, 1_414_213, 30, 100);
        state.fee_sharing_numerator = Some(BigUint::from(1666u32));
        state.allow_dynamic_fee = true;
        state.datum = state.to_cbor();

        let back = V2PoolState::from_cbor(&state.datum).unwrap();
        assert_eq!(back, state);
        assert_eq!(decode_pool(&encode_pool(&state)).unwrap(), state);
    }

    #[test]
    fn test_wrong_pool_tag() {
        let pd = encode_pool(&pool(1, 1, 1, 30, 30));
        let (_, fields) = pd.as_constr().unwrap();
        let wrong = PlutusData::constr(3, fields.to_vec());
        assert_eq!(decode_pool(&wrong).unwrap_err(), Error::WrongPoolTag { tag: 124 });
    }

    #[test]
    fn test_fee_sharing_discriminant() {
        let pd = encode_pool(&pool(1, 1, 1, 30, 30));
        let (_, fields) = pd.as_constr().unwrap();

        let mut just = fields.to_vec();
        just[8] = PlutusData::constr(0, vec![PlutusData::int(5000u32)]);
        let state = decode_pool(&PlutusData::constr(0, just)).unwrap();
        assert_eq!(state.fee_sharing_numerator, Some(BigUint::from(5000u32)));

        // Payload of a non-zero alternative is ignored.
        let mut other = fields.to_vec();
        other[8] = PlutusData::constr(1, vec![PlutusData::int(5000u32)]);
        let state = decode_pool(&PlutusData::constr(0, other)).unwrap();
        assert_eq!(state.fee_sharing_numerator, None);

        let mut flag = fields.to_vec();
        flag[9] = PlutusData::unit(1);
        assert!(decode_pool(&PlutusData::constr(0, flag.clone())).unwrap().allow_dynamic_fee);
        flag[9] = PlutusData::unit(2);
        assert!(!decode_pool(&PlutusData::constr(0, flag)).unwrap().allow_dynamic_fee);
    }

    #[test]
    fn test_decode_errors_point_at_field() {
        let pd = encode_pool(&pool(10, 20, 30, 30, 30));
        let (_, fields) = pd.as_constr().unwrap();
        for k in 0..fields.len() {
            let truncated = PlutusData::constr(0, fields[..k].to_vec());
            let err = decode_pool(&truncated).unwrap_err();
            assert_eq!(err.field(), Some(format!("V2PoolState[{}]", k).as_str()));

            let mut mutated = fields.to_vec();
            mutated[k] = PlutusData::bytes(vec![0xff]);
            let err = decode_pool(&PlutusData::constr(0, mutated)).unwrap_err();
            let field = err.field().unwrap().to_string();
            assert!(field.starts_with(&format!("V2PoolState[{}]", k)), "{}", field);
        }
    }

    #[test]
    fn test_price_and_zap_detection() {
        let state = pool(3_000, 1_000, 1, 30, 30);
        assert_eq!(state.price().unwrap(), BigRational::from_integer(BigInt::from(3)));
        assert!(pool(1, 0, 1, 30, 30).price().is_err());
        assert_eq!(state.pair(), "ADA/MIN");

        let policy = hex::decode("e16c2dc8ae937e8d3790c7fd7168d7b994621ba14ca11415f39fed72").unwrap();
        assert!(state.is_zap_pool(&policy));
        assert!(!state.is_zap_pool(&[0u8; 28]));
        assert_eq!(
            hex::encode(&state.lp_asset(&policy).asset_name),
            "6c3ea488e6ff940bb6fb1b18fd605b5931d9fefde6440117015ba484cf321200"
        );
    }
}
