//! Decimal-scaled integer arithmetic shared by every component.
//!
//! Values are raw `u128` integers carrying an implicit `10^-decimals` scale.
//! Products are widened to 256 bits before division so `a * b / d` is exact
//! up to the final floor, which all downstream formulas depend on.

use anchor_lang::prelude::*;
use primitive_types::U256;

use crate::error::PegError::{
  ArithmeticOverflow, ConfigDecimals, DivisionByZero, MalformedReserves,
};

/// Largest decimal exponent accepted for prices and ratios.
pub const MAX_DECIMALS: u8 = 18;

/// Narrows a 256-bit value back to `u128`.
#[must_use]
pub fn narrow(value: U256) -> Option<u128> {
  if value > U256::from(u128::MAX) {
    None
  } else {
    Some(value.as_u128())
  }
}

/// `a * b / denominator`, rounded down.
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128> {
  if denominator == 0 {
    return Err(DivisionByZero.into());
  }
  let quotient = U256::from(a) * U256::from(b) / U256::from(denominator);
  narrow(quotient).ok_or(ArithmeticOverflow.into())
}

/// `10^decimals` as a raw integer.
pub fn scale(decimals: u8) -> Result<u128> {
  if decimals > MAX_DECIMALS {
    Err(ConfigDecimals.into())
  } else {
    10u128.checked_pow(u32::from(decimals)).ok_or(ArithmeticOverflow.into())
  }
}

/// `numerator / denominator` expressed with `decimals` places.
pub fn ratio(numerator: u128, denominator: u128, decimals: u8) -> Result<u128> {
  mul_div_floor(numerator, scale(decimals)?, denominator)
}

/// Spot price of the base token in quote units:
///   `price = reserve_quote * 10^decimals / reserve_base`
pub fn pool_price(
  reserve_base: u128,
  reserve_quote: u128,
  decimals: u8,
) -> Result<u128> {
  if reserve_base == 0 || reserve_quote == 0 {
    Err(MalformedReserves.into())
  } else {
    ratio(reserve_quote, reserve_base, decimals)
  }
}

/// Integer square root, rounded down.
#[must_use]
pub fn sqrt_floor(value: U256) -> U256 {
  value.integer_sqrt()
}

/// Full 256-bit product of two raw amounts.
#[must_use]
pub fn product(a: u128, b: u128) -> U256 {
  U256::from(a) * U256::from(b)
}
