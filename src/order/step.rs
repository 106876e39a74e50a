//! Order steps: what an order asks the batcher to do.
//!
//! Each variant is a constructor whose alternative is its index below and
//! whose fields are an indefinite array in the listed order (`Donation` has
//! no fields and is written as a definite empty array):
//!   0  SwapExactIn        direction, swap_amount, minimum_received, killable
//!   1  Stop               direction, swap_amount, stop_received
//!   2  OCO                direction, swap_amount, minimum_received, stop_received
//!   3  SwapExactOut       direction, maximum_swap_amount, expected_received, killable
//!   4  Deposit            deposit_amount, minimum_lp, killable
//!   5  Withdraw           withdrawal_amount, minimum_asset_a, minimum_asset_b, killable
//!   6  ZapOut             direction, withdrawal_amount, minimum_received, killable
//!   7  PartialSwap        direction, total_swap_amount, io_ratio_numerator,
//!                         io_ratio_denominator, hops, minimum_swap_amount_required,
//!                         max_batcher_fee_each_time
//!   8  WithdrawImbalance  withdrawal_amount, ratio_asset_a, ratio_asset_b,
//!                         minimum_asset_a, killable
//!   9  SwapRouting        routings, swap_amount, minimum_received
//!   10 Donation
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Asset;
use crate::plutus::{PlutusData, ToPlutusData, TryFromPData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    BToA,
    AToB,
}

impl ToPlutusData for Direction {
    fn to_pd(&self) -> PlutusData {
        match self {
            Direction::BToA => PlutusData::unit(0),
            Direction::AToB => PlutusData::unit(1),
        }
    }
}

impl TryFromPData for Direction {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("Direction")?;
        fields.expect_len(0)?;
        match alternative {
            0 => Ok(Direction::BToA),
            1 => Ok(Direction::AToB),
            other => Err(unknown("Direction", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Killable {
    PendingOnFailed,
    KillOnFailed,
}

impl ToPlutusData for Killable {
    fn to_pd(&self) -> PlutusData {
        match self {
            Killable::PendingOnFailed => PlutusData::unit(0),
            Killable::KillOnFailed => PlutusData::unit(1),
        }
    }
}

impl TryFromPData for Killable {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("Killable")?;
        fields.expect_len(0)?;
        match alternative {
            0 => Ok(Killable::PendingOnFailed),
            1 => Ok(Killable::KillOnFailed),
            other => Err(unknown("Killable", other)),
        }
    }
}

/// `All` means whatever reaches the order output; the number is still carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmountType {
    SpecificAmount,
    All,
}

impl AmountType {
    fn alternative(self) -> u64 {
        match self {
            AmountType::SpecificAmount => 0,
            AmountType::All => 1,
        }
    }

    fn from_alternative(alternative: u64) -> Result<Self> {
        match alternative {
            0 => Ok(AmountType::SpecificAmount),
            1 => Ok(AmountType::All),
            other => Err(unknown("AmountType", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapAmount {
    pub kind: AmountType,
    #[serde(with = "crate::models::quantity")]
    pub amount: BigUint,
}

impl SwapAmount {
    pub fn specific(amount: impl Into<BigUint>) -> Self {
        Self { kind: AmountType::SpecificAmount, amount: amount.into() }
    }

    pub fn all(amount: impl Into<BigUint>) -> Self {
        Self { kind: AmountType::All, amount: amount.into() }
    }
}

impl ToPlutusData for SwapAmount {
    fn to_pd(&self) -> PlutusData {
        PlutusData::constr(self.kind.alternative(), vec![self.amount.to_pd()])
    }
}

impl TryFromPData for SwapAmount {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("SwapAmount")?;
        let kind = AmountType::from_alternative(alternative)?;
        fields.expect_len(1)?;
        Ok(SwapAmount { kind, amount: fields.int(0)? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAmount {
    pub kind: AmountType,
    #[serde(with = "crate::models::quantity")]
    pub amount_a: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub amount_b: BigUint,
}

impl ToPlutusData for DepositAmount {
    fn to_pd(&self) -> PlutusData {
        PlutusData::constr(
            self.kind.alternative(),
            vec![self.amount_a.to_pd(), self.amount_b.to_pd()],
        )
    }
}

impl TryFromPData for DepositAmount {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("DepositAmount")?;
        let kind = AmountType::from_alternative(alternative)?;
        fields.expect_len(2)?;
        Ok(DepositAmount {
            kind,
            amount_a: fields.int(0)?,
            amount_b: fields.int(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalAmount {
    pub kind: AmountType,
    #[serde(with = "crate::models::quantity")]
    pub lp_amount: BigUint,
}

impl ToPlutusData for WithdrawalAmount {
    fn to_pd(&self) -> PlutusData {
        PlutusData::constr(self.kind.alternative(), vec![self.lp_amount.to_pd()])
    }
}

impl TryFromPData for WithdrawalAmount {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let (alternative, fields) = data.fields("WithdrawalAmount")?;
        let kind = AmountType::from_alternative(alternative)?;
        fields.expect_len(1)?;
        Ok(WithdrawalAmount { kind, lp_amount: fields.int(0)? })
    }
}

/// One hop of a routed swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub lp_asset: Asset,
    pub direction: Direction,
}

impl ToPlutusData for Route {
    fn to_pd(&self) -> PlutusData {
        PlutusData::constr(0, vec![self.lp_asset.to_pd(), self.direction.to_pd()])
    }
}

impl TryFromPData for Route {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        let fields = data.record("Route")?;
        fields.expect_len(2)?;
        Ok(Route {
            lp_asset: fields.decode(0)?,
            direction: fields.decode(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapExactIn {
    pub direction: Direction,
    pub swap_amount: SwapAmount,
    #[serde(with = "crate::models::quantity")]
    pub minimum_received: BigUint,
    pub killable: Killable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub direction: Direction,
    pub swap_amount: SwapAmount,
    #[serde(with = "crate::models::quantity")]
    pub stop_received: BigUint,
}

/// One-cancels-the-other: fills at the limit or at the stop, whichever comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oco {
    pub direction: Direction,
    pub swap_amount: SwapAmount,
    #[serde(with = "crate::models::quantity")]
    pub minimum_received: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub stop_received: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapExactOut {
    pub direction: Direction,
    pub maximum_swap_amount: SwapAmount,
    #[serde(with = "crate::models::quantity")]
    pub expected_received: BigUint,
    pub killable: Killable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub deposit_amount: DepositAmount,
    #[serde(with = "crate::models::quantity")]
    pub minimum_lp: BigUint,
    pub killable: Killable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub withdrawal_amount: WithdrawalAmount,
    #[serde(with = "crate::models::quantity")]
    pub minimum_asset_a: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub minimum_asset_b: BigUint,
    pub killable: Killable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZapOut {
    pub direction: Direction,
    pub withdrawal_amount: WithdrawalAmount,
    #[serde(with = "crate::models::quantity")]
    pub minimum_received: BigUint,
    pub killable: Killable,
}

/// Limit order filled over several batches at a fixed in/out ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSwap {
    pub direction: Direction,
    #[serde(with = "crate::models::quantity")]
    pub total_swap_amount: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub io_ratio_numerator: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub io_ratio_denominator: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub hops: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub minimum_swap_amount_required: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub max_batcher_fee_each_time: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawImbalance {
    pub withdrawal_amount: WithdrawalAmount,
    #[serde(with = "crate::models::quantity")]
    pub ratio_asset_a: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub ratio_asset_b: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub minimum_asset_a: BigUint,
    pub killable: Killable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRouting {
    pub routings: Vec<Route>,
    pub swap_amount: SwapAmount,
    #[serde(with = "crate::models::quantity")]
    pub minimum_received: BigUint,
}

impl SwapRouting {
    /// Check the route count against a hop count known from elsewhere.
    pub fn ensure_hops(&self, expected: usize) -> Result<()> {
        if self.routings.len() == expected {
            Ok(())
        } else {
            Err(Error::shape(
                "SwapRouting[0]",
                format!("{} routes", expected),
                format!("{} routes", self.routings.len()),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepType {
    SwapExactIn,
    Stop,
    Oco,
    SwapExactOut,
    Deposit,
    Withdraw,
    ZapOut,
    PartialSwap,
    WithdrawImbalance,
    SwapRouting,
    Donation,
}

impl StepType {
    pub const ALL: [StepType; 11] = [
        StepType::SwapExactIn,
        StepType::Stop,
        StepType::Oco,
        StepType::SwapExactOut,
        StepType::Deposit,
        StepType::Withdraw,
        StepType::ZapOut,
        StepType::PartialSwap,
        StepType::WithdrawImbalance,
        StepType::SwapRouting,
        StepType::Donation,
    ];

    pub fn alternative(self) -> u64 {
        self as u64
    }

    pub fn from_alternative(alternative: u64) -> Option<StepType> {
        usize::try_from(alternative)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn name(self) -> &'static str {
        match self {
            StepType::SwapExactIn => "SwapExactIn",
            StepType::Stop => "Stop",
            StepType::Oco => "OCO",
            StepType::SwapExactOut => "SwapExactOut",
            StepType::Deposit => "Deposit",
            StepType::Withdraw => "Withdraw",
            StepType::ZapOut => "ZapOut",
            StepType::PartialSwap => "PartialSwap",
            StepType::WithdrawImbalance => "WithdrawImbalance",
            StepType::SwapRouting => "SwapRouting",
            StepType::Donation => "Donation",
        }
    }

    /// Transaction metadata label for orders of this kind.
    pub fn metadata_message(self) -> &'static str {
        match self {
            StepType::SwapExactIn => "minswap-kupo-rs: Swap Exact In Order",
            StepType::Stop => "minswap-kupo-rs: Stop Order",
            StepType::Oco => "minswap-kupo-rs: OCO Order",
            StepType::SwapExactOut => "minswap-kupo-rs: Swap Exact Out Order",
            StepType::Deposit => "minswap-kupo-rs: Deposit Order",
            StepType::Withdraw => "minswap-kupo-rs: Withdraw Order",
            StepType::ZapOut => "minswap-kupo-rs: Zap Out Order",
            StepType::PartialSwap => "minswap-kupo-rs: Partial Fill Order",
            StepType::WithdrawImbalance => "minswap-kupo-rs: Withdraw Order",
            StepType::SwapRouting => "minswap-kupo-rs: Routing Order",
            StepType::Donation => "minswap-kupo-rs: Donation Order",
        }
    }
}

pub const CANCEL_ORDER_MESSAGE: &str = "minswap-kupo-rs: Cancel Order";
pub const MIXED_ORDERS_MESSAGE: &str = "minswap-kupo-rs: Mixed Orders";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    SwapExactIn(SwapExactIn),
    Stop(Stop),
    Oco(Oco),
    SwapExactOut(SwapExactOut),
    Deposit(Deposit),
    Withdraw(Withdraw),
    ZapOut(ZapOut),
    PartialSwap(PartialSwap),
    WithdrawImbalance(WithdrawImbalance),
    SwapRouting(SwapRouting),
    Donation,
}

impl Step {
    pub fn step_type(&self) -> StepType {
        match self {
            Step::SwapExactIn(_) => StepType::SwapExactIn,
            Step::Stop(_) => StepType::Stop,
            Step::Oco(_) => StepType::Oco,
            Step::SwapExactOut(_) => StepType::SwapExactOut,
            Step::Deposit(_) => StepType::Deposit,
            Step::Withdraw(_) => StepType::Withdraw,
            Step::ZapOut(_) => StepType::ZapOut,
            Step::PartialSwap(_) => StepType::PartialSwap,
            Step::WithdrawImbalance(_) => StepType::WithdrawImbalance,
            Step::SwapRouting(_) => StepType::SwapRouting,
            Step::Donation => StepType::Donation,
        }
    }

    pub fn metadata_message(&self) -> &'static str {
        self.step_type().metadata_message()
    }
}

pub fn encode_step(step: &Step) -> PlutusData {
    let alternative = step.step_type().alternative();
    let fields = match step {
        Step::SwapExactIn(s) => vec![
            s.direction.to_pd(),
            s.swap_amount.to_pd(),
            s.minimum_received.to_pd(),
            s.killable.to_pd(),
        ],
        Step::Stop(s) => vec![
            s.direction.to_pd(),
            s.swap_amount.to_pd(),
            s.stop_received.to_pd(),
        ],
        Step::Oco(s) => vec![
            s.direction.to_pd(),
            s.swap_amount.to_pd(),
            s.minimum_received.to_pd(),
            s.stop_received.to_pd(),
        ],
        Step::SwapExactOut(s) => vec![
            s.direction.to_pd(),
            s.maximum_swap_amount.to_pd(),
            s.expected_received.to_pd(),
            s.killable.to_pd(),
        ],
        Step::Deposit(s) => vec![
            s.deposit_amount.to_pd(),
            s.minimum_lp.to_pd(),
            s.killable.to_pd(),
        ],
        Step::Withdraw(s) => vec![
            s.withdrawal_amount.to_pd(),
            s.minimum_asset_a.to_pd(),
            s.minimum_asset_b.to_pd(),
            s.killable.to_pd(),
        ],
        Step::ZapOut(s) => vec![
            s.direction.to_pd(),
            s.withdrawal_amount.to_pd(),
            s.minimum_received.to_pd(),
            s.killable.to_pd(),
        ],
        Step::PartialSwap(s) => vec![
            s.direction.to_pd(),
            s.total_swap_amount.to_pd(),
            s.io_ratio_numerator.to_pd(),
            s.io_ratio_denominator.to_pd(),
            s.hops.to_pd(),
            s.minimum_swap_amount_required.to_pd(),
            s.max_batcher_fee_each_time.to_pd(),
        ],
        Step::WithdrawImbalance(s) => vec![
            s.withdrawal_amount.to_pd(),
            s.ratio_asset_a.to_pd(),
            s.ratio_asset_b.to_pd(),
            s.minimum_asset_a.to_pd(),
            s.killable.to_pd(),
        ],
        Step::SwapRouting(s) => vec![
            PlutusData::list(s.routings.iter().map(Route::to_pd).collect()),
            s.swap_amount.to_pd(),
            s.minimum_received.to_pd(),
        ],
        Step::Donation => return PlutusData::unit(alternative),
    };
    PlutusData::constr(alternative, fields)
}

pub fn decode_step(data: &PlutusData) -> Result<Step> {
    let (alternative, fields) = data.fields("Step")?;
    let step_type = StepType::from_alternative(alternative).ok_or_else(|| Error::UnknownVariant {
        kind: "Step",
        field: String::new(),
        alternative,
    })?;
    let f = fields.renamed(step_type.name());

    let step = match step_type {
        StepType::SwapExactIn => {
            f.expect_len(4)?;
            Step::SwapExactIn(SwapExactIn {
                direction: f.decode(0)?,
                swap_amount: f.decode(1)?,
                minimum_received: f.int(2)?,
                killable: f.decode(3)?,
            })
        }
        StepType::Stop => {
            f.expect_len(3)?;
            Step::Stop(Stop {
                direction: f.decode(0)?,
                swap_amount: f.decode(1)?,
                stop_received: f.int(2)?,
            })
        }
        StepType::Oco => {
            f.expect_len(4)?;
            Step::Oco(Oco {
                direction: f.decode(0)?,
                swap_amount: f.decode(1)?,
                minimum_received: f.int(2)?,
                stop_received: f.int(3)?,
            })
        }
        StepType::SwapExactOut => {
            f.expect_len(4)?;
            Step::SwapExactOut(SwapExactOut {
                direction: f.decode(0)?,
                maximum_swap_amount: f.decode(1)?,
                expected_received: f.int(2)?,
                killable: f.decode(3)?,
            })
        }
        StepType::Deposit => {
            f.expect_len(3)?;
            Step::Deposit(Deposit {
                deposit_amount: f.decode(0)?,
                minimum_lp: f.int(1)?,
                killable: f.decode(2)?,
            })
        }
        StepType::Withdraw => {
            f.expect_len(4)?;
            Step::Withdraw(Withdraw {
                withdrawal_amount: f.decode(0)?,
                minimum_asset_a: f.int(1)?,
                minimum_asset_b: f.int(2)?,
                killable: f.decode(3)?,
            })
        }
        StepType::ZapOut => {
            f.expect_len(4)?;
            Step::ZapOut(ZapOut {
                direction: f.decode(0)?,
                withdrawal_amount: f.decode(1)?,
                minimum_received: f.int(2)?,
                killable: f.decode(3)?,
            })
        }
        StepType::PartialSwap => {
            f.expect_len(7)?;
            Step::PartialSwap(PartialSwap {
                direction: f.decode(0)?,
                total_swap_amount: f.int(1)?,
                io_ratio_numerator: f.int(2)?,
                io_ratio_denominator: f.int(3)?,
                hops: f.int(4)?,
                minimum_swap_amount_required: f.int(5)?,
                max_batcher_fee_each_time: f.int(6)?,
            })
        }
        StepType::WithdrawImbalance => {
            f.expect_len(5)?;
            Step::WithdrawImbalance(WithdrawImbalance {
                withdrawal_amount: f.decode(0)?,
                ratio_asset_a: f.int(1)?,
                ratio_asset_b: f.int(2)?,
                minimum_asset_a: f.int(3)?,
                killable: f.decode(4)?,
            })
        }
        StepType::SwapRouting => {
            f.expect_len(3)?;
            let routings = f
                .list(0)?
                .iter()
                .enumerate()
                .map(|(i, route)| {
                    Route::try_from_pd(route)
                        .map_err(|e| e.nested_in(&format!("SwapRouting[0][{}]", i)))
                })
                .collect::<Result<Vec<_>>>()?;
            Step::SwapRouting(SwapRouting {
                routings,
                swap_amount: f.decode(1)?,
                minimum_received: f.int(2)?,
            })
        }
        StepType::Donation => {
            f.expect_len(0)?;
            Step::Donation
        }
    };
    Ok(step)
}

impl ToPlutusData for Step {
    fn to_pd(&self) -> PlutusData {
        encode_step(self)
    }
}

impl TryFromPData for Step {
    fn try_from_pd(data: &PlutusData) -> Result<Self> {
        decode_step(data)
    }
}

fn unknown(kind: &'static str, alternative: u64) -> Error {
    Error::UnknownVariant {
        kind,
        field: String::new(),
        alternative,
    }
}
