//! Orders for the stable-swap pools.
//!
//! Assets are addressed by their index in the pool's asset list. `Withdraw`
//! and `WithdrawImbalance` carry one amount per pool asset, and those amounts
//! are the constructor fields themselves.
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::config::NetworkId;
use crate::error::{Error, Result};
use crate::models::address::Address;
use crate::plutus::{constr_tag, Fields, PlutusData, ToPlutusData};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StableStep {
    Swap {
        asset_in_index: u64,
        asset_out_index: u64,
        #[serde(with = "crate::models::quantity")]
        minimum_asset_out: BigUint,
    },
    Deposit {
        #[serde(with = "crate::models::quantity")]
        minimum_lp: BigUint,
    },
    Withdraw {
        #[serde(with = "crate::models::quantity::vec")]
        minimum_amounts: Vec<BigUint>,
    },
    WithdrawImbalance {
        #[serde(with = "crate::models::quantity::vec")]
        withdraw_amounts: Vec<BigUint>,
    },
    ZapOut {
        asset_out_index: u64,
        #[serde(with = "crate::models::quantity")]
        minimum_asset_out: BigUint,
    },
}

impl ToPlutusData for StableStep {
    fn to_pd(&self) -> PlutusData {
        match self {
            StableStep::Swap { asset_in_index, asset_out_index, minimum_asset_out } => {
                PlutusData::constr(
                    0,
                    vec![
                        PlutusData::int(*asset_in_index),
                        PlutusData::int(*asset_out_index),
                        minimum_asset_out.to_pd(),
                    ],
                )
            }
            StableStep::Deposit { minimum_lp } => PlutusData::constr(1, vec![minimum_lp.to_pd()]),
            StableStep::Withdraw { minimum_amounts } => {
                PlutusData::constr(2, minimum_amounts.iter().map(ToPlutusData::to_pd).collect())
            }
            StableStep::WithdrawImbalance { withdraw_amounts } => {
                PlutusData::constr(3, withdraw_amounts.iter().map(ToPlutusData::to_pd).collect())
            }
            StableStep::ZapOut { asset_out_index, minimum_asset_out } => PlutusData::constr(
                4,
                vec![PlutusData::int(*asset_out_index), minimum_asset_out.to_pd()],
            ),
        }
    }
}

fn all_ints(f: Fields<'_>) -> Result<Vec<BigUint>> {
    (0..f.len()).map(|i| f.int(i)).collect()
}

pub fn decode_stable_step(data: &PlutusData) -> Result<StableStep> {
    let (alternative, fields) = data.fields("StableStep")?;
    match alternative {
        0 => {
            let f = fields.renamed("StableSwap");
            f.expect_len(3)?;
            Ok(StableStep::Swap {
                asset_in_index: f.u64(0)?,
                asset_out_index: f.u64(1)?,
                minimum_asset_out: f.int(2)?,
            })
        }
        1 => {
            let f = fields.renamed("StableDeposit");
            f.expect_len(1)?;
            Ok(StableStep::Deposit { minimum_lp: f.int(0)? })
        }
        2 => Ok(StableStep::Withdraw {
            minimum_amounts: all_ints(fields.renamed("StableWithdraw"))?,
        }),
        3 => Ok(StableStep::WithdrawImbalance {
            withdraw_amounts: all_ints(fields.renamed("StableWithdrawImbalance"))?,
        }),
        4 => {
            let f = fields.renamed("StableZapOut");
            f.expect_len(2)?;
            Ok(StableStep::ZapOut {
                asset_out_index: f.u64(0)?,
                minimum_asset_out: f.int(1)?,
            })
        }
        other => Err(Error::UnknownVariant {
            kind: "StableStep",
            field: String::new(),
            alternative: other,
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableOrderDatum {
    pub sender: Address,
    pub receiver: Address,
    /// `None` and an empty hash are both written as `Nothing`.
    #[serde(default, with = "opt_hex")]
    pub receiver_datum_hash: Option<Vec<u8>>,
    pub step: StableStep,
    #[serde(with = "crate::models::quantity")]
    pub batcher_fee: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub output_ada: BigUint,
}

impl StableOrderDatum {
    pub fn to_cbor(&self) -> Vec<u8> {
        encode_stable_order(self).to_cbor()
    }

    pub fn from_cbor(bytes: &[u8], network: NetworkId) -> Result<Self> {
        decode_stable_order(&PlutusData::from_cbor(bytes)?, network)
    }

    pub fn metadata_message(&self) -> &'static str {
        match self.step {
            StableStep::Swap { .. } => "minswap-kupo-rs: Swap Exact In Order",
            StableStep::Deposit { .. } => "minswap-kupo-rs: Deposit Order",
            StableStep::Withdraw { .. } | StableStep::WithdrawImbalance { .. } => {
                "minswap-kupo-rs: Withdraw Order"
            }
            StableStep::ZapOut { .. } => "minswap-kupo-rs: Zap Out Order",
        }
    }
}

pub fn encode_stable_order(order: &StableOrderDatum) -> PlutusData {
    let datum_hash = match &order.receiver_datum_hash {
        Some(hash) if !hash.is_empty() => {
            PlutusData::constr_definite(0, vec![PlutusData::bytes(hash.clone())])
        }
        _ => PlutusData::unit(1),
    };
    PlutusData::constr(
        0,
        vec![
            order.sender.to_pd(),
            order.receiver.to_pd(),
            datum_hash,
            order.step.to_pd(),
            order.batcher_fee.to_pd(),
            order.output_ada.to_pd(),
        ],
    )
}

pub fn decode_stable_order(data: &PlutusData, network: NetworkId) -> Result<StableOrderDatum> {
    let (alternative, f) = data.fields("StableOrderDatum")?;
    if alternative != 0 {
        return Err(Error::InvalidDatumShape { tag: constr_tag(alternative) });
    }
    f.expect_len(6)?;
    let sender = f.decode_with(0, |v| Address::from_pd(v, network))?;
    let receiver = f.decode_with(1, |v| Address::from_pd(v, network))?;
    let receiver_datum_hash = f.decode_with(2, |maybe| {
        let (alternative, inner) = maybe.fields("Maybe")?;
        match alternative {
            0 => {
                inner.expect_len(1)?;
                Ok(Some(inner.bytes(0)?))
            }
            1 => {
                inner.expect_len(0)?;
                Ok(None)
            }
            other => Err(Error::UnknownVariant {
                kind: "Maybe",
                field: String::new(),
                alternative: other,
            }),
        }
    })?;
    Ok(StableOrderDatum {
        sender,
        receiver,
        receiver_datum_hash,
        step: f.decode_with(3, decode_stable_step)?,
        batcher_fee: f.int(4)?,
        output_ada: f.int(5)?,
    })
}

mod opt_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER: &str = "addr_test1qpssc0r090a9u0pyvdr9y76sm2xzx04n6d4j0y5hukcx6rxz4dtgkhfdynadkea0qezv99wljdl076xkg2krm96nn8jszmh3w7";

    fn n(v: u64) -> BigUint {
        BigUint::from(v)
    }

    fn datum(step: StableStep, hash: Option<Vec<u8>>) -> StableOrderDatum {
        let sender: Address = SENDER.parse().unwrap();
        StableOrderDatum {
            sender: sender.clone(),
            receiver: sender,
            receiver_datum_hash: hash,
            step,
            batcher_fee: n(2_000_000),
            output_ada: n(2_000_000),
        }
    }

    fn steps() -> Vec<StableStep> {
        vec![
            StableStep::Swap { asset_in_index: 0, asset_out_index: 1, minimum_asset_out: n(990) },
            StableStep::Deposit { minimum_lp: n(1) },
            StableStep::Withdraw { minimum_amounts: vec![n(10), n(20), n(30)] },
            StableStep::WithdrawImbalance { withdraw_amounts: vec![n(5), n(0)] },
            StableStep::ZapOut { asset_out_index: 1, minimum_asset_out: n(7) },
        ]
    }

    #[test]
    fn test_stable_orders_roundtrip() {
        for step in steps() {
            for hash in [None, Some(vec![0xb8; 28])] {
                let d = datum(step.clone(), hash);
                let back = StableOrderDatum::from_cbor(&d.to_cbor(), NetworkId::Testnet).unwrap();
                assert_eq!(back, d);
            }
        }
    }

    #[test]
    fn test_withdraw_amounts_are_the_fields() {
        let pd = StableStep::Withdraw { minimum_amounts: vec![n(1), n(2)] }.to_pd();
        assert_eq!(pd.to_cbor_hex(), "d87b9f0102ff");
    }

    #[test]
    fn test_empty_datum_hash_is_nothing() {
        let d = datum(steps()[1].clone(), Some(Vec::new()));
        let pd = encode_stable_order(&d);
        let (_, fields) = pd.as_constr().unwrap();
        assert_eq!(fields[2].to_cbor_hex(), "d87a80");
        let back = decode_stable_order(&pd, NetworkId::Testnet).unwrap();
        assert_eq!(back.receiver_datum_hash, None);
    }

    #[test]
    fn test_swap_index_must_be_int() {
        let pd = PlutusData::constr(
            0,
            vec![PlutusData::int(0u32), PlutusData::bytes(vec![1]), PlutusData::int(1u32)],
        );
        let err = decode_stable_step(&pd).unwrap_err();
        assert_eq!(err.field(), Some("StableSwap[1]"));
        assert!(matches!(
            decode_stable_step(&PlutusData::unit(5)),
            Err(Error::UnknownVariant { kind: "StableStep", .. })
        ));
    }

    #[test]
    fn test_metadata_message() {
        assert_eq!(
            datum(steps()[4].clone(), None).metadata_message(),
            "minswap-kupo-rs: Zap Out Order"
        );
    }
}
