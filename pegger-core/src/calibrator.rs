//! Pure search and simulation over a [`PairState`].
//!
//! Nothing here touches a live pool: each function replays the pool's own
//! integer rounding through [`crate::pair_math`] and returns the state it would
//! leave behind.

use anchor_lang::prelude::*;

use std::ops::RangeInclusive;

use crate::error::PegError::{
  ArithmeticOverflow, InsufficientBalance, InsufficientLiquidityMinted,
  SearchRange,
};
use crate::fixed_point::pool_price;
use crate::pair_math::{
  get_amount_out, optimal_deposit, BurnResult, PairState, SwapResult, SwapSide,
};
use crate::price_ratio::Direction;

/// Smallest swap that reaches the target, with the reserves it produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pick {
  pub amount_in: u128,
  pub amount_out: u128,
  pub reserve_base: u128,
  pub reserve_quote: u128,
}

/// One exact-input swap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapLeg {
  pub side: SwapSide,
  pub amount_in: u128,
}

/// Tokens actually deposited when re-adding liquidity, and what is left over.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddEstimate {
  pub pair: PairState,
  pub amount_base: u128,
  pub amount_quote: u128,
  pub liquidity: u128,
  pub leftover_base: u128,
  pub leftover_quote: u128,
}

/// Outcome of remove, swap, re-add.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NowEstimate {
  pub pair: PairState,
  pub removed_base: u128,
  pub removed_quote: u128,
  pub amount_out: u128,
  pub lp_minted: u128,
  pub leftover_base: u128,
  pub leftover_quote: u128,
}

/// Everything an intervention will do, computed before touching the pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InterventionPlan {
  pub direction: Direction,
  pub lp_amount: u128,
  pub swap: Option<SwapLeg>,
  /// Whether the chosen swap lands on or beyond the target price.
  pub reaches_target: bool,
  pub estimate: NowEstimate,
}

/// Evaluates one candidate: `Some` when the swap executes and the resulting
/// price is on the far side of the target. A price past `u128::MAX` is
/// treated as `u128::MAX`.
fn crossing(
  pair: &PairState,
  side: SwapSide,
  amount_in: u128,
  target_price: u128,
  decimals: u8,
) -> Result<Option<Pick>> {
  let (reserve_in, reserve_out) = pair.oriented(side);
  let amount_out =
    get_amount_out(amount_in, reserve_in, reserve_out, pair.swap_fee)?;
  if amount_out == 0 {
    return Ok(None);
  }
  let SwapResult { pair: after, .. } = pair.swap(side, amount_in)?;
  let price =
    match pool_price(after.reserve_base, after.reserve_quote, decimals) {
      Err(e) if e == ArithmeticOverflow.into() => u128::MAX,
      price => price?,
    };
  let crossed = match side {
    SwapSide::QuoteToBase => price >= target_price,
    SwapSide::BaseToQuote => price <= target_price,
  };
  Ok(crossed.then_some(Pick {
    amount_in,
    amount_out,
    reserve_base: after.reserve_base,
    reserve_quote: after.reserve_quote,
  }))
}

/// Binary search for the smallest crossing amount in `search`.
/// Post-swap price is monotonic in the input amount, so the first crossing
/// splits the range cleanly.
fn pick(
  pair: &PairState,
  side: SwapSide,
  target_price: u128,
  decimals: u8,
  search: RangeInclusive<u128>,
) -> Result<Option<Pick>> {
  let (start, end) = search.into_inner();
  if start > end {
    return Err(SearchRange.into());
  }
  let mut lo = start.max(1);
  let mut hi = end;
  if lo > hi {
    return Ok(None);
  }
  let Some(mut found) = crossing(pair, side, hi, target_price, decimals)?
  else {
    return Ok(None);
  };
  while lo < hi {
    let mid = lo + (hi - lo) / 2;
    match crossing(pair, side, mid, target_price, decimals)? {
      Some(candidate) => {
        found = candidate;
        hi = mid;
      }
      None => lo = mid + 1,
    }
  }
  Ok(Some(found))
}

/// Smallest quote input in `search` that lifts the price to `target_price` or
/// above. `None` when even the end of the range falls short.
pub fn pick_buy(
  pair: &PairState,
  target_price: u128,
  decimals: u8,
  search: RangeInclusive<u128>,
) -> Result<Option<Pick>> {
  pick(pair, SwapSide::QuoteToBase, target_price, decimals, search)
}

/// Smallest base input in `search` that pushes the price to `target_price` or
/// below.
pub fn pick_sell(
  pair: &PairState,
  target_price: u128,
  decimals: u8,
  search: RangeInclusive<u128>,
) -> Result<Option<Pick>> {
  pick(pair, SwapSide::BaseToQuote, target_price, decimals, search)
}

pub fn estimate_swap(pair: &PairState, leg: SwapLeg) -> Result<SwapResult> {
  pair.swap(leg.side, leg.amount_in)
}

/// Proportional withdrawal of `liquidity`, protocol fee accrued first.
pub fn estimate_remove(
  pair: &PairState,
  liquidity: u128,
) -> Result<BurnResult> {
  pair.burn(liquidity)
}

/// Deposits as much of the offered tokens as the pair ratio allows.
/// `None` when the offer would mint no liquidity.
pub fn estimate_add(
  pair: &PairState,
  offered_base: u128,
  offered_quote: u128,
) -> Result<Option<AddEstimate>> {
  if offered_base == 0 || offered_quote == 0 {
    return Ok(None);
  }
  let (amount_base, amount_quote) = optimal_deposit(
    offered_base,
    offered_quote,
    pair.reserve_base,
    pair.reserve_quote,
  )?;
  if amount_base == 0 || amount_quote == 0 {
    return Ok(None);
  }
  let minted = match pair.mint(amount_base, amount_quote) {
    Ok(minted) => minted,
    Err(e) if e == InsufficientLiquidityMinted.into() => return Ok(None),
    Err(e) => return Err(e),
  };
  Ok(Some(AddEstimate {
    pair: minted.pair,
    amount_base,
    amount_quote,
    liquidity: minted.liquidity,
    leftover_base: offered_base - amount_base,
    leftover_quote: offered_quote - amount_quote,
  }))
}

/// Simulates removing `liquidity_to_remove`, running the optional swap with
/// the withdrawn tokens and re-adding whatever the new ratio accepts.
pub fn estimate_now(
  pair: &PairState,
  liquidity_to_remove: u128,
  swap: Option<SwapLeg>,
) -> Result<NowEstimate> {
  let removed = estimate_remove(pair, liquidity_to_remove)?;
  let mut held_base = removed.amount_base;
  let mut held_quote = removed.amount_quote;
  let mut state = removed.pair;
  let mut amount_out = 0;

  if let Some(leg) = swap {
    let held_in = match leg.side {
      SwapSide::BaseToQuote => held_base,
      SwapSide::QuoteToBase => held_quote,
    };
    if leg.amount_in > held_in {
      return Err(InsufficientBalance.into());
    }
    let swapped = estimate_swap(&state, leg)?;
    amount_out = swapped.amount_out;
    state = swapped.pair;
    match leg.side {
      SwapSide::BaseToQuote => {
        held_base -= leg.amount_in;
        held_quote += amount_out;
      }
      SwapSide::QuoteToBase => {
        held_quote -= leg.amount_in;
        held_base += amount_out;
      }
    }
  }

  let (pair, lp_minted, leftover_base, leftover_quote) =
    match estimate_add(&state, held_base, held_quote)? {
      Some(add) => (
        add.pair,
        add.liquidity,
        add.leftover_base,
        add.leftover_quote,
      ),
      None => (state, 0, held_base, held_quote),
    };

  Ok(NowEstimate {
    pair,
    removed_base: removed.amount_base,
    removed_quote: removed.amount_quote,
    amount_out,
    lp_minted,
    leftover_base,
    leftover_quote,
  })
}

/// Plans a full intervention for `lp_amount` of withdrawn liquidity.
///
/// The swap is bounded by the withdrawn amount of the input token: quote when
/// raising the price, base when lowering it. When no amount in that range
/// reaches the target the whole bound is swapped and `reaches_target` is false.
pub fn plan_intervention(
  pair: &PairState,
  direction: Direction,
  target_price: u128,
  decimals: u8,
  lp_amount: u128,
) -> Result<InterventionPlan> {
  let removed = estimate_remove(pair, lp_amount)?;
  let after_remove = removed.pair;
  let (side, bound) = match direction {
    Direction::Up => (SwapSide::QuoteToBase, removed.amount_quote),
    Direction::Down => (SwapSide::BaseToQuote, removed.amount_base),
  };
  let picked = if bound > 0 {
    pick(&after_remove, side, target_price, decimals, 1..=bound)?
  } else {
    None
  };
  let reaches_target = picked.is_some();
  let amount_in = picked.map_or(bound, |p| p.amount_in);

  let (reserve_in, reserve_out) = after_remove.oriented(side);
  let fee = after_remove.swap_fee;
  let swap = if amount_in > 0
    && get_amount_out(amount_in, reserve_in, reserve_out, fee)? > 0
  {
    Some(SwapLeg { side, amount_in })
  } else {
    None
  };

  let estimate = estimate_now(pair, lp_amount, swap)?;
  Ok(InterventionPlan {
    direction,
    lp_amount,
    swap,
    reaches_target,
    estimate,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixed_point::{mul_div_floor, product};
  use crate::pair_math::DEFAULT_SWAP_FEE;
  use crate::util::proptest::*;

  use primitive_types::U256;
  use proptest::prelude::*;

  const E18: u128 = 1_000_000_000_000_000_000;

  fn pool(base: u128, quote: u128) -> PairState {
    PairState {
      reserve_base: base,
      reserve_quote: quote,
      total_supply: crate::fixed_point::narrow(
        crate::fixed_point::sqrt_floor(product(base, quote)),
      )
      .unwrap_or_default(),
      k_last: U256::zero(),
      fee_on: false,
      swap_fee: DEFAULT_SWAP_FEE,
    }
  }

  #[test]
  fn pick_buy_reaches_target() -> Result<()> {
    let pair = pool(100_000 * E18, 150_000 * E18);
    let target = 2_150_000;
    let found = pick_buy(&pair, target, 6, 1..=100_000 * E18)?
      .ok_or(SearchRange)?;
    let price = pool_price(found.reserve_base, found.reserve_quote, 6)?;
    assert!(price >= target);
    let side = SwapSide::QuoteToBase;
    let before = crossing(&pair, side, found.amount_in - 1, target, 6)?;
    assert_eq!(before, None);
    Ok(())
  }

  #[test]
  fn pick_sell_reaches_target() -> Result<()> {
    let pair = pool(100_000 * E18, 210_000 * E18);
    let target = 1_500_000;
    let found = pick_sell(&pair, target, 6, 1..=100_000 * E18)?
      .ok_or(SearchRange)?;
    let price = pool_price(found.reserve_base, found.reserve_quote, 6)?;
    assert!(price <= target);
    Ok(())
  }

  #[test]
  fn pick_buy_past_price_range_counts_as_crossed() -> Result<()> {
    // Price 1e33 raw at 18 decimals; draining the base side overflows u128.
    let pair = pool(1_000, E18);
    let target = 2 * E18 * 1_000_000_000_000_000;
    let side = SwapSide::QuoteToBase;
    let ceiling = 10_000 * E18;
    assert_eq!(
      pool_price(1, pair.reserve_quote + ceiling, 18),
      Err(ArithmeticOverflow.into())
    );
    assert!(crossing(&pair, side, ceiling, target, 18)?.is_some());
    let wide = pick_buy(&pair, target, 18, 1..=ceiling)?;
    let narrow = pick_buy(&pair, target, 18, 1..=10 * E18)?;
    assert!(wide.is_some());
    assert_eq!(wide, narrow);
    Ok(())
  }

  #[test]
  fn pick_starts_at_search_start() -> Result<()> {
    let pair = pool(100_000 * E18, 150_000 * E18);
    let target = 2_150_000;
    let first = pick_buy(&pair, target, 6, 1..=100_000 * E18)?
      .ok_or(SearchRange)?;
    let start = 50_000 * E18;
    assert!(first.amount_in < start);
    let found = pick_buy(&pair, target, 6, start..=100_000 * E18)?
      .ok_or(SearchRange)?;
    assert_eq!(found.amount_in, start);
    Ok(())
  }

  #[test]
  fn pick_out_of_reach() -> Result<()> {
    let pair = pool(100_000 * E18, 150_000 * E18);
    assert_eq!(pick_buy(&pair, 2_150_000, 6, 1..=E18)?, None);
    Ok(())
  }

  #[test]
  fn pick_inverted_range() {
    let pair = pool(1_000_000, 1_000_000);
    let out = pick_buy(&pair, 2_000_000, 6, 10..=1);
    assert!(out.is_err_and(|e| e == SearchRange.into()));
  }

  #[test]
  fn already_at_target_takes_first_executable() -> Result<()> {
    let pair = pool(1_000_000_000, 1_000_000_000);
    let found = pick_buy(&pair, 1_000_000, 6, 1..=1_000_000)?
      .ok_or(SearchRange)?;
    // One unit in yields zero out at this depth; two is the first real swap.
    assert_eq!(found.amount_in, 2);
    Ok(())
  }

  #[test]
  fn estimate_add_keeps_ratio() -> Result<()> {
    let pair = pool(1_000_000, 2_000_000);
    let add = estimate_add(&pair, 1_000, 5_000)?
      .ok_or(InsufficientLiquidityMinted)?;
    assert_eq!((add.amount_base, add.amount_quote), (1_000, 2_000));
    assert_eq!((add.leftover_base, add.leftover_quote), (0, 3_000));
    assert_eq!(
      add.liquidity,
      mul_div_floor(1_000, pair.total_supply, 1_000_000)?
    );
    Ok(())
  }

  #[test]
  fn estimate_add_one_sided_is_skipped() -> Result<()> {
    let pair = pool(1_000_000, 2_000_000);
    assert_eq!(estimate_add(&pair, 1_000, 0)?, None);
    Ok(())
  }

  #[test]
  fn estimate_now_rejects_overspend() {
    let pair = pool(1_000_000, 2_000_000);
    let leg = SwapLeg {
      side: SwapSide::QuoteToBase,
      amount_in: 1_000_000,
    };
    let out = estimate_now(&pair, 1_000, Some(leg));
    assert!(out.is_err_and(|e| e == InsufficientBalance.into()));
  }

  #[test]
  fn plan_up_moves_price_toward_target() -> Result<()> {
    let pair = pool(100_000 * E18, 200_000 * E18);
    let price_before = pair.price(6)?;
    let lp = pair.total_supply / 20;
    let plan = plan_intervention(&pair, Direction::Up, 2_050_000, 6, lp)?;
    let price_after = plan.estimate.pair.price(6)?;
    assert!(price_after > price_before);
    assert_eq!(plan.swap.map(|leg| leg.side), Some(SwapSide::QuoteToBase));
    Ok(())
  }

  #[test]
  fn plan_down_moves_price_toward_target() -> Result<()> {
    let pair = pool(100_000 * E18, 210_000 * E18);
    let price_before = pair.price(6)?;
    let lp = pair.total_supply / 20;
    let plan = plan_intervention(&pair, Direction::Down, 2_050_000, 6, lp)?;
    let price_after = plan.estimate.pair.price(6)?;
    assert!(price_after < price_before);
    assert!(plan.reaches_target);
    assert!(price_after <= 2_050_000);
    Ok(())
  }

  proptest! {
    #[test]
    fn pick_buy_is_first_crossing(
      pair in pair_state(()),
      bump_bps in 1u128..2_000,
    ) {
      let price = pair.price(6)?;
      let target = price + price * bump_bps / 10_000 + 1;
      let end = pair.reserve_quote;
      if let Some(found) = pick_buy(&pair, target, 6, 1..=end)? {
        let after = pool_price(found.reserve_base, found.reserve_quote, 6)?;
        prop_assert!(after >= target);
        if found.amount_in > 1 {
          let side = SwapSide::QuoteToBase;
          let prev = crossing(&pair, side, found.amount_in - 1, target, 6)?;
          prop_assert_eq!(prev, None);
        }
      }
    }

    #[test]
    fn pick_sell_is_first_crossing(
      pair in pair_state(()),
      drop_bps in 1u128..2_000,
    ) {
      let price = pair.price(6)?;
      let target = price - price * drop_bps / 10_000;
      let end = pair.reserve_base;
      if let Some(found) = pick_sell(&pair, target, 6, 1..=end)? {
        let after = pool_price(found.reserve_base, found.reserve_quote, 6)?;
        prop_assert!(after <= target);
        if found.amount_in > 1 {
          let side = SwapSide::BaseToQuote;
          let prev = crossing(&pair, side, found.amount_in - 1, target, 6)?;
          prop_assert_eq!(prev, None);
        }
      }
    }

    #[test]
    fn estimate_now_keeps_invariant_per_share(
      pair in pair_state(()),
      fraction_bps in 1u128..1_000,
      spend_bps in 0u128..10_000,
      up in any::<bool>(),
    ) {
      let liquidity = pair.total_supply * fraction_bps / 10_000;
      let removed = estimate_remove(&pair, liquidity)?;
      let (side, held) = if up {
        (SwapSide::QuoteToBase, removed.amount_quote)
      } else {
        (SwapSide::BaseToQuote, removed.amount_base)
      };
      let amount_in = held * spend_bps / 10_000;
      let leg = (amount_in > 0).then_some(SwapLeg { side, amount_in });
      if let Ok(now) = estimate_now(&pair, liquidity, leg) {
        // k / supply^2 never shrinks: burns and mints round for the pool,
        // swaps only add fees.
        let supply_before = U256::from(pair.total_supply);
        let supply_after = U256::from(now.pair.total_supply);
        let before = pair.invariant() * supply_after * supply_after;
        let after = now.pair.invariant() * supply_before * supply_before;
        prop_assert!(after >= before);
      }
    }

    #[test]
    fn estimate_remove_with_protocol_fee(
      pair in pair_state_fee_on(()),
      fraction_bps in 1u128..5_000,
    ) {
      let liquidity = pair.total_supply * fraction_bps / 10_000;
      let removed = estimate_remove(&pair, liquidity)?;
      let fee = removed.protocol_fee_liquidity;
      prop_assert_eq!(
        removed.pair.total_supply,
        pair.total_supply + fee - liquidity
      );
      prop_assert_eq!(removed.pair.k_last, removed.pair.invariant());
      // Share is taken against the supply inflated by the fee mint.
      prop_assert_eq!(
        removed.amount_base,
        mul_div_floor(liquidity, pair.reserve_base, pair.total_supply + fee)?
      );
    }
  }
}
