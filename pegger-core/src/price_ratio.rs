use anchor_lang::prelude::*;
use serde::{Deserialize, Serialize};

use std::fmt::Display;

use crate::error::PegError::{DegeneratePrice, NegativePRatio};
use crate::fixed_point::{mul_div_floor, scale};
use crate::price_ratio::Direction::{Down, Up};

/// Which way the pool price has to move to reach the target.
///   - `Up`: target above the pool price, base token must get dearer.
///   - `Down`: target below the pool price.
#[derive(
  Copy,
  Clone,
  Debug,
  PartialEq,
  Eq,
  AnchorSerialize,
  AnchorDeserialize,
  Serialize,
  Deserialize,
)]
pub enum Direction {
  Up,
  Down,
}

impl Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Up => f.write_str("Up"),
      Down => f.write_str("Down"),
    }
  }
}

/// Compares the current pool price with the target.
/// Equal prices have no direction; callers treat that as a no-op.
#[must_use]
pub fn find_direction(
  current_price: u128,
  target_price: u128,
) -> Option<Direction> {
  if target_price > current_price {
    Some(Up)
  } else if target_price < current_price {
    Some(Down)
  } else {
    None
  }
}

/// Relative distance between two prices in `scale` units.
///
/// ```txt
///   Up:   scale - price_a * scale / price_b
///   Down: price_a * scale / price_b - scale
/// ```
///
/// `price_a` is the current pool price, `price_b` the target.
pub fn compute_p_ratio(
  direction: Direction,
  scale: u128,
  price_a: u128,
  price_b: u128,
) -> Result<u128> {
  if price_b == 0 {
    return Err(DegeneratePrice.into());
  }
  let relative = mul_div_floor(price_a, scale, price_b)?;
  match direction {
    Up => scale.checked_sub(relative),
    Down => relative.checked_sub(scale),
  }
  .ok_or(NegativePRatio.into())
}

/// Direction and pRatio for moving `current_price` to `target_price`.
/// Returns `None` when the prices already agree.
pub fn p_ratio_for_move(
  current_price: u128,
  target_price: u128,
  decimals: u8,
) -> Result<Option<(Direction, u128)>> {
  if target_price == 0 {
    return Err(DegeneratePrice.into());
  }
  match find_direction(current_price, target_price) {
    Some(direction) => {
      let p_ratio = compute_p_ratio(
        direction,
        scale(decimals)?,
        current_price,
        target_price,
      )?;
      Ok(Some((direction, p_ratio)))
    }
    None => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  const SCALE_6: u128 = 1_000_000;

  #[test]
  fn direction_from_prices() {
    assert_eq!(find_direction(2_000_000, 2_500_000), Some(Up));
    assert_eq!(find_direction(2_000_000, 1_500_000), Some(Down));
    assert_eq!(find_direction(2_000_000, 2_000_000), None);
  }

  #[test]
  fn p_ratio_up_known_value() -> Result<()> {
    let ratio = compute_p_ratio(Up, SCALE_6, 2_000_000, 2_500_000)?;
    assert_eq!(ratio, 200_000);
    Ok(())
  }

  #[test]
  fn p_ratio_down_known_value() -> Result<()> {
    let ratio = compute_p_ratio(Down, SCALE_6, 2_100_000, 1_500_000)?;
    assert_eq!(ratio, 400_000);
    Ok(())
  }

  #[test]
  fn p_ratio_zero_target() {
    let ratio = compute_p_ratio(Up, SCALE_6, 2_000_000, 0);
    assert!(ratio.is_err_and(|e| e == DegeneratePrice.into()));
  }

  #[test]
  fn p_ratio_wrong_direction() {
    let up = compute_p_ratio(Up, SCALE_6, 2_500_000, 2_000_000);
    let down = compute_p_ratio(Down, SCALE_6, 2_000_000, 2_500_000);
    assert!(up.is_err_and(|e| e == NegativePRatio.into()));
    assert!(down.is_err_and(|e| e == NegativePRatio.into()));
  }

  #[test]
  fn p_ratio_for_equal_prices() -> Result<()> {
    assert_eq!(p_ratio_for_move(1_500_000, 1_500_000, 6)?, None);
    Ok(())
  }

  #[test]
  fn p_ratio_for_move_picks_formula() -> Result<()> {
    assert_eq!(
      p_ratio_for_move(2_000_000, 2_500_000, 6)?,
      Some((Up, 200_000))
    );
    assert_eq!(
      p_ratio_for_move(2_100_000, 1_500_000, 6)?,
      Some((Down, 400_000))
    );
    Ok(())
  }

  proptest! {
    #[test]
    fn up_ratio_below_scale(
      current in 1u128..1_000_000_000_000,
      bump in 1u128..1_000_000_000_000,
    ) {
      let target = current + bump;
      let ratio = compute_p_ratio(Up, SCALE_6, current, target)?;
      prop_assert!(ratio <= SCALE_6);
    }

    #[test]
    fn direction_aware_formula_never_negative(
      current in 1u128..1_000_000_000_000,
      target in 1u128..1_000_000_000_000,
    ) {
      match p_ratio_for_move(current, target, 6)? {
        Some((Up, ratio)) => prop_assert!(ratio >= 1),
        Some((Down, _)) => prop_assert!(current > target),
        None => prop_assert_eq!(current, target),
      }
    }
  }
}
