use anchor_lang::prelude::*;

use crate::error::PegError::{
  ArithmeticOverflow, InsufficientLiquidity, MalformedReserves,
};
use crate::fixed_point::{mul_div_floor, scale};
use crate::price_ratio::{compute_p_ratio, Direction};

/// LP amount to withdraw so the pool ratio shifts by `p_ratio`.
///
/// ```txt
///   half = reference * p_ratio / (2 * 10^decimals)
///   lp   = half * lp_supply / reference
/// ```
///
/// Moving the reserve ratio by `p_ratio` only needs one side moved by half of
/// it, hence the factor of two. Floor rounding at both steps.
pub fn compute_xlp(
  reference_amount: u128,
  p_ratio: u128,
  lp_supply: u128,
  decimals: u8,
) -> Result<u128> {
  if reference_amount == 0 {
    return Err(MalformedReserves.into());
  }
  let two_scale = scale(decimals)?
    .checked_mul(2)
    .ok_or(ArithmeticOverflow)?;
  let half = mul_div_floor(reference_amount, p_ratio, two_scale)?;
  let lp_amount = mul_div_floor(half, lp_supply, reference_amount)?;
  if lp_amount > lp_supply {
    Err(InsufficientLiquidity.into())
  } else {
    Ok(lp_amount)
  }
}

/// Composes pRatio and [`compute_xlp`], taking the base reserve as reference
/// when raising the price and the quote reserve when lowering it.
pub fn compute_xlp_for_direction(
  base_reserve: u128,
  quote_reserve: u128,
  price_before: u128,
  price_target: u128,
  direction: Direction,
  lp_supply: u128,
  decimals: u8,
) -> Result<u128> {
  let p_ratio =
    compute_p_ratio(direction, scale(decimals)?, price_before, price_target)?;
  let reference = match direction {
    Direction::Up => base_reserve,
    Direction::Down => quote_reserve,
  };
  compute_xlp(reference, p_ratio, lp_supply, decimals)
}
