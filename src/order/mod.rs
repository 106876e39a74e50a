//! Order datums and redeemers of the V2 order validator.
//!
//! An order datum is constructor 0 with nine indefinite fields:
//! canceller, refund receiver, refund receiver datum, success receiver,
//! success receiver datum, LP asset, step, max batcher fee, expiry.

pub mod stable;
pub mod step;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::config::{NetworkId, V2Config};
use crate::error::{Error, Result};
use crate::models::address::{Address, Credential, CREDENTIAL_HASH_LEN};
use crate::models::Asset;
use crate::plutus::{constr_tag, PlutusData, ToPlutusData, TryFromPData};

pub use step::{
    decode_step, encode_step, AmountType, Deposit, DepositAmount, Direction, Killable, Oco,
    PartialSwap, Route, Step, StepType, Stop, SwapAmount, SwapExactIn, SwapExactOut, SwapRouting,
    Withdraw, WithdrawImbalance, WithdrawalAmount, ZapOut, CANCEL_ORDER_MESSAGE,
    MIXED_ORDERS_MESSAGE,
};

/// Batcher fee attached to every order built by this crate, in lovelace.
pub const FIXED_BATCHER_FEE: u64 = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationKind {
    Signature,
    SpendScript,
    WithdrawScript,
    MintScript,
}

impl AuthorizationKind {
    fn alternative(self) -> u64 {
        match self {
            AuthorizationKind::Signature => 0,
            AuthorizationKind::SpendScript => 1,
            AuthorizationKind::WithdrawScript => 2,
            AuthorizationKind::MintScript => 3,
        }
    }
}

/// Who may cancel an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationMethod {
    kind: AuthorizationKind,
    #[serde(with = "hex::serde")]
    hash: Vec<u8>,
}

impl AuthorizationMethod {
    pub fn new(kind: AuthorizationKind, hash: Vec<u8>) -> Result<Self> {
        if hash.len() != CREDENTIAL_HASH_LEN {
            return Err(Error::shape(
                "AuthorizationMethod[0]",
                format!("{}-byte hash", CREDENTIAL_HASH_LEN),
                format!("{} bytes", hash.len()),
            ));
        }
        Ok(Self { kind, hash })
    }

    /// Signature of the key (or script) that pays into `address`.
    pub fn owner_of(address: &Address) -> Self {
        let kind = match address.payment {
            Credential::Key(_) => AuthorizationKind::Signature,
            Credential::Script(_) => AuthorizationKind::SpendScript,
        };
        Self { kind, hash: address.payment.hash().to_vec() }
    }

    pub fn kind(&self) -> AuthorizationKind {
        self.kind
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }
}

impl ToPlutusData for AuthorizationMethod {
    fn to_pd(&self) -> PlutusData {
        PlutusData::constr(self.kind.alternative(), vec![PlutusData::bytes(self.hash.clone())])
    }
}

impl TryFromPData for AuthorizationMethod {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("AuthorizationMethod")?;
        let kind = match alternative {
            0 => AuthorizationKind::Signature,
            1 => AuthorizationKind::SpendScript,
            2 => AuthorizationKind::WithdrawScript,
            3 => AuthorizationKind::MintScript,
            other => {
                return Err(Error::UnknownVariant {
                    kind: "AuthorizationMethod",
                    field: String::new(),
                    alternative: other,
                })
            }
        };
        fields.expect_len(1)?;
        AuthorizationMethod::new(kind, fields.bytes(0)?)
    }
}

/// Datum to attach to an output paid by the batcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtraDatum {
    NoDatum,
    DatumHash(#[serde(with = "hex::serde")] Vec<u8>),
    InlineDatum(#[serde(with = "hex::serde")] Vec<u8>),
}

impl ToPlutusData for ExtraDatum {
    fn to_pd(&self) -> PlutusData {
        match self {
            ExtraDatum::NoDatum => PlutusData::unit(0),
            ExtraDatum::DatumHash(hash) => {
                PlutusData::constr_definite(1, vec![PlutusData::bytes(hash.clone())])
            }
            ExtraDatum::InlineDatum(hash) => {
                PlutusData::constr_definite(2, vec![PlutusData::bytes(hash.clone())])
            }
        }
    }
}

impl TryFromPData for ExtraDatum {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("ExtraDatum")?;
        match alternative {
            0 => {
                fields.expect_len(0)?;
                Ok(ExtraDatum::NoDatum)
            }
            1 | 2 => {
                fields.expect_len(1)?;
                let hash = fields.bytes(0)?;
                Ok(if alternative == 1 {
                    ExtraDatum::DatumHash(hash)
                } else {
                    ExtraDatum::InlineDatum(hash)
                })
            }
            other => Err(Error::UnknownVariant {
                kind: "ExtraDatum",
                field: String::new(),
                alternative: other,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirySetting {
    #[serde(with = "crate::models::quantity")]
    pub expired_at_posix_millis: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub max_cancellation_tip: BigUint,
}

fn encode_expiry(expiry: &Option<ExpirySetting>) -> PlutusData {
    match expiry {
        Some(e) => PlutusData::constr_definite(
            0,
            vec![e.expired_at_posix_millis.to_pd(), e.max_cancellation_tip.to_pd()],
        ),
        None => PlutusData::unit(1),
    }
}

fn decode_expiry(data: &PlutusData) -> Result<Option<ExpirySetting>> {
    let (alternative, fields) = data.fields("ExpirySetting")?;
    match alternative {
        0 => {
            fields.expect_len(2)?;
            Ok(Some(ExpirySetting {
                expired_at_posix_millis: fields.int(0)?,
                max_cancellation_tip: fields.int(1)?,
            }))
        }
        1 => {
            fields.expect_len(0)?;
            Ok(None)
        }
        other => Err(Error::UnknownVariant {
            kind: "ExpirySetting",
            field: String::new(),
            alternative: other,
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDatum {
    pub canceller: AuthorizationMethod,
    pub refund_receiver: Address,
    pub refund_receiver_datum: ExtraDatum,
    pub success_receiver: Address,
    pub success_receiver_datum: ExtraDatum,
    pub lp_asset: Asset,
    pub step: Step,
    #[serde(with = "crate::models::quantity")]
    pub max_batcher_fee: BigUint,
    pub expiry: Option<ExpirySetting>,
}

impl OrderDatum {
    pub fn to_pd(&self) -> PlutusData {
        encode_order(self)
    }

    pub fn to_cbor(&self) -> Vec<u8> {
        encode_order(self).to_cbor()
    }

    pub fn from_cbor(bytes: &[u8], network: NetworkId) -> Result<OrderDatum> {
        decode_order(&PlutusData::from_cbor(bytes)?, network)
    }
}

pub fn encode_order(order: &OrderDatum) -> PlutusData {
    PlutusData::constr(
        0,
        vec![
            order.canceller.to_pd(),
            order.refund_receiver.to_pd(),
            order.refund_receiver_datum.to_pd(),
            order.success_receiver.to_pd(),
            order.success_receiver_datum.to_pd(),
            order.lp_asset.to_pd(),
            encode_step(&order.step),
            order.max_batcher_fee.to_pd(),
            encode_expiry(&order.expiry),
        ],
    )
}

/// Decode an order datum. Addresses carry no network in their Plutus form,
/// so it has to be supplied.
pub fn decode_order(data: &PlutusData, network: NetworkId) -> Result<OrderDatum> {
    let (alternative, f) = data.fields("OrderDatum")?;
    if alternative != 0 {
        return Err(Error::InvalidDatumShape { tag: constr_tag(alternative) });
    }
    f.expect_len(9)?;
    Ok(OrderDatum {
        canceller: f.decode(0)?,
        refund_receiver: f.decode_with(1, |v| Address::from_pd(v, network))?,
        refund_receiver_datum: f.decode(2)?,
        success_receiver: f.decode_with(3, |v| Address::from_pd(v, network))?,
        success_receiver_datum: f.decode(4)?,
        lp_asset: f.decode(5)?,
        step: f.decode(6)?,
        max_batcher_fee: f.int(7)?,
        expiry: f.decode_with(8, decode_expiry)?,
    })
}

/// Spend redeemers of the order validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderRedeemer {
    ApplyOrder,
    CancelOrderByOwner,
    CancelExpiredOrderByAnyone,
}

impl OrderRedeemer {
    pub fn to_pd(self) -> PlutusData {
        let alternative = match self {
            OrderRedeemer::ApplyOrder => 0,
            OrderRedeemer::CancelOrderByOwner => 1,
            OrderRedeemer::CancelExpiredOrderByAnyone => 2,
        };
        // Empty, but still an indefinite array on the wire.
        PlutusData::constr(alternative, Vec::new())
    }

    pub fn to_cbor(self) -> Vec<u8> {
        self.to_pd().to_cbor()
    }
}

/// Payment script hash of the order validator.
pub fn order_script_hash(config: &V2Config) -> Result<Vec<u8>> {
    let order = Address::from_bech32(config.order_enterprise_address)?;
    match order.payment {
        Credential::Script(hash) => Ok(hash),
        Credential::Key(_) => Err(Error::InvalidAddress(format!(
            "{}: order address must be a script address",
            config.order_enterprise_address
        ))),
    }
}

/// Address an order from `sender` is paid to: the order script as payment
/// part, the sender's stake reference kept so staking rewards still accrue.
pub fn build_order_address(sender: &Address, config: &V2Config) -> Result<Address> {
    let script = order_script_hash(config)?;
    Ok(Address::new(
        config.network,
        Credential::Script(script),
        sender.stake.clone(),
    ))
}
