//! Constant-product AMM arithmetic.
//!
//! Everything is computed on arbitrary precision integers and floors where
//! the protocol floors. Fees are `numerator / denominator`, the protocol
//! denominator being [`DEFAULT_FEE_DENOMINATOR`].
use num_bigint::{BigInt, BigUint};
use num_integer::Roots;
use num_rational::BigRational;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::pool::V2PoolState;

pub const DEFAULT_FEE_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fraction {
    #[serde(with = "crate::models::quantity")]
    pub numerator: BigUint,
    #[serde(with = "crate::models::quantity")]
    pub denominator: BigUint,
}

impl Fraction {
    pub fn to_rational(&self) -> Result<BigRational> {
        if self.denominator.is_zero() {
            return Err(Error::precondition("fraction with zero denominator"));
        }
        Ok(BigRational::new(
            BigInt::from(self.numerator.clone()),
            BigInt::from(self.denominator.clone()),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlippageDirection {
    /// Lower bound on what is received.
    Down,
    /// Upper bound on what is paid.
    Up,
}

fn fee_multiplier(fee_numerator: &BigUint, fee_denominator: &BigUint) -> Result<BigUint> {
    if fee_numerator >= fee_denominator {
        return Err(Error::precondition(format!(
            "fee {}/{} must be below 1",
            fee_numerator, fee_denominator
        )));
    }
    Ok(fee_denominator - fee_numerator)
}

/// Output of swapping `amount_in` into the pool.
pub fn amount_out(
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    amount_in: &BigUint,
    fee_numerator: &BigUint,
    fee_denominator: &BigUint,
) -> Result<BigUint> {
    let diff = fee_multiplier(fee_numerator, fee_denominator)?;
    let in_with_fee = diff * amount_in;
    let denominator = fee_denominator * reserve_in + &in_with_fee;
    if denominator.is_zero() {
        return Err(Error::precondition("swap into an empty pool"));
    }
    Ok(in_with_fee * reserve_out / denominator)
}

/// Input needed to receive exactly `amount_out`.
pub fn amount_in(
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    amount_out: &BigUint,
    fee_numerator: &BigUint,
    fee_denominator: &BigUint,
) -> Result<BigUint> {
    if amount_out >= reserve_out {
        return Err(Error::precondition(format!(
            "amount out {} exceeds reserve {}",
            amount_out, reserve_out
        )));
    }
    let diff = fee_multiplier(fee_numerator, fee_denominator)?;
    let numerator = reserve_in * amount_out * fee_denominator;
    let denominator = (reserve_out - amount_out) * diff;
    Ok(numerator / denominator + 1u32)
}

/// How much of `amount_in` to swap before a deposit so that what is left
/// matches the pool ratio, as an exact fraction.
pub fn deposit_swap_amount(
    amount_in: &BigUint,
    amount_out: &BigUint,
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    fee_numerator: &BigUint,
) -> Result<Fraction> {
    let d = BigInt::from(DEFAULT_FEE_DENOMINATOR);
    let n = BigInt::from(fee_numerator.clone());
    if n >= d {
        return Err(Error::precondition(format!("fee {}/{} must be below 1", n, d)));
    }
    let ai = BigInt::from(amount_in.clone());
    let ao = BigInt::from(amount_out.clone());
    let ri = BigInt::from(reserve_in.clone());
    let ro = BigInt::from(reserve_out.clone());

    let two_d_minus_n = BigInt::from(2) * &d - &n;
    let d_minus_n = &d - &n;

    let x = (&ao + &ro) * &ri;
    let y = BigInt::from(4) * (&ao + &ro) * (&ao * &ri * &ri - &ai * &ri * &ro);
    let z = BigInt::from(2) * (&ao + &ro);
    let a = &x * &x * &two_d_minus_n * &two_d_minus_n - y * &d * &d_minus_n;
    let b = &two_d_minus_n * &x;

    let Some(a) = a.to_biguint() else {
        return Err(Error::precondition("negative discriminant"));
    };
    let numerator = BigInt::from(Roots::sqrt(&a)) - b;
    let denominator = z * d_minus_n;
    match (numerator.to_biguint(), denominator.to_biguint()) {
        (Some(numerator), Some(denominator)) if !denominator.is_zero() => Ok(Fraction {
            numerator,
            denominator,
        }),
        _ => Err(Error::precondition(format!(
            "swap amount {}/{} is not a non-negative fraction",
            numerator, denominator
        ))),
    }
}

/// LP tokens minted for depositing `amount_a` and `amount_b`.
///
/// When the amounts are off the pool ratio, the excess side is partly swapped
/// first, paying that side's trading fee.
pub fn deposit_lp_amount(amount_a: &BigUint, amount_b: &BigUint, pool: &V2PoolState) -> Result<BigUint> {
    if pool.reserve_a.is_zero() || pool.reserve_b.is_zero() {
        return Err(Error::precondition("deposit into a pool with an empty reserve"));
    }
    let liquidity = &pool.total_liquidity;
    let ratio_a = amount_a * liquidity / &pool.reserve_a;
    let ratio_b = amount_b * liquidity / &pool.reserve_b;

    let (amount, other, reserve, other_reserve, fee) = match ratio_a.cmp(&ratio_b) {
        std::cmp::Ordering::Equal => return Ok(ratio_a),
        std::cmp::Ordering::Greater => (
            amount_a,
            amount_b,
            &pool.reserve_a,
            &pool.reserve_b,
            &pool.base_fee_a_numerator,
        ),
        std::cmp::Ordering::Less => (
            amount_b,
            amount_a,
            &pool.reserve_b,
            &pool.reserve_a,
            &pool.base_fee_b_numerator,
        ),
    };

    let swap = deposit_swap_amount(amount, other, reserve, other_reserve, fee)?;
    let num = BigInt::from(swap.numerator);
    let den = BigInt::from(swap.denominator);
    let lp = (BigInt::from(amount.clone()) * &den - &num) * BigInt::from(liquidity.clone())
        / (BigInt::from(reserve.clone()) * &den + &num);
    match lp.to_biguint() {
        Some(lp) => Ok(lp),
        None => Err(Error::precondition(format!("negative lp amount {}", lp))),
    }
}

/// Exact `numerator / 10^k` form of a tolerance, read from its shortest
/// decimal representation so `0.2` means two tenths.
fn decimal_fraction(tolerance: f64) -> Result<(BigUint, BigUint)> {
    // Display for f64 never uses an exponent
    let text = format!("{}", tolerance.abs());
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let digits = format!("{}{}", int, frac);
    let num = digits
        .parse::<BigUint>()
        .map_err(|_| Error::precondition(format!("slippage tolerance {}", tolerance)))?;
    Ok((num, num_traits::pow(BigUint::from(10u32), frac.len())))
}

/// Widen `amount` by a slippage tolerance: `Down` divides by `1 + t`, `Up`
/// multiplies by it, both floored. `t` is taken at its shortest decimal value.
pub fn apply_slippage(tolerance: f64, amount: &BigUint, direction: SlippageDirection) -> Result<BigUint> {
    if !tolerance.is_finite() || !(0.0..1.0).contains(&tolerance) {
        return Err(Error::precondition(format!(
            "slippage tolerance {} must be in [0, 1)",
            tolerance
        )));
    }
    let (num, den) = decimal_fraction(tolerance)?;
    Ok(match direction {
        SlippageDirection::Down => amount * &den / (&den + &num),
        SlippageDirection::Up => amount * (&den + &num) / &den,
    })
}
