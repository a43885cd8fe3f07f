//! Constant-product pair arithmetic, mirroring the pool's own integer rounding.
//!
//! Every step floors exactly like the on-chain pair and router do, so a
//! simulation built from these functions matches execution bit for bit:
//!   - swap: `out = a·(1-f)·r_out / (r_in + a·(1-f))`
//!   - burn: `amount_i = liquidity · r_i / total_supply`
//!   - mint: `min(a_0·ts / r_0, a_1·ts / r_1)`, first deposit
//!     `√(a_0·a_1) - MINIMUM_LIQUIDITY`
//!   - protocol fee: `ts·(√k - √k_last) / (5·√k + √k_last)`, minted before
//!     every mint and burn when the fee switch is on

use anchor_lang::prelude::*;
use fix::prelude::*;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::error::PegError::{
  ArithmeticOverflow, DivisionByZero, InsufficientLiquidityBurned,
  InsufficientLiquidityMinted, InsufficientOutputAmount, InvalidSwapFee,
  MalformedReserves, ZeroAmount,
};
use crate::fixed_point::{
  mul_div_floor, narrow, pool_price, product, sqrt_floor,
};

/// LP permanently locked by the first deposit.
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Default pool fee of 0.30%, the `997 / 1000` rule.
pub const DEFAULT_SWAP_FEE: UFix64<N4> = UFix64::constant(30);

/// Which token goes into a swap.
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
pub enum SwapSide {
  /// Sell base for quote; lowers the base price.
  BaseToQuote,
  /// Buy base with quote; raises the base price.
  QuoteToBase,
}

/// Point-in-time pair state, enough to replay any swap, mint or burn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PairState {
  pub reserve_base: u128,
  pub reserve_quote: u128,
  pub total_supply: u128,
  pub k_last: U256,
  pub fee_on: bool,
  pub swap_fee: UFix64<N4>,
}

/// Result of burning LP against a pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BurnResult {
  pub pair: PairState,
  pub amount_base: u128,
  pub amount_quote: u128,
  pub protocol_fee_liquidity: u128,
}

/// Result of depositing both tokens into a pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MintResult {
  pub pair: PairState,
  pub liquidity: u128,
  pub protocol_fee_liquidity: u128,
}

/// Output of a swap and the reserves it leaves behind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
  pub pair: PairState,
  pub amount_out: u128,
}

/// Output amount for an exact input under the constant-product invariant.
pub fn get_amount_out(
  amount_in: u128,
  reserve_in: u128,
  reserve_out: u128,
  swap_fee: UFix64<N4>,
) -> Result<u128> {
  if amount_in == 0 {
    return Err(ZeroAmount.into());
  }
  if reserve_in == 0 || reserve_out == 0 {
    return Err(MalformedReserves.into());
  }
  let one = UFix64::<N4>::one();
  let factor = one.checked_sub(&swap_fee).ok_or(InvalidSwapFee)?;
  if factor == UFix64::zero() {
    return Err(InvalidSwapFee.into());
  }
  let in_with_fee = U256::from(amount_in) * U256::from(factor.bits);
  let numerator = in_with_fee * U256::from(reserve_out);
  let denominator = U256::from(reserve_in) * U256::from(one.bits) + in_with_fee;
  narrow(numerator / denominator).ok_or(ArithmeticOverflow.into())
}

/// Router helper: amount of B equivalent to `amount_a` at the current ratio.
pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128> {
  if amount_a == 0 {
    return Err(ZeroAmount.into());
  }
  if reserve_a == 0 || reserve_b == 0 {
    return Err(MalformedReserves.into());
  }
  mul_div_floor(amount_a, reserve_b, reserve_a)
}

/// Router amount selection for a deposit: keeps one desired amount whole and
/// scales the other down to the pair ratio.
pub fn optimal_deposit(
  desired_base: u128,
  desired_quote: u128,
  reserve_base: u128,
  reserve_quote: u128,
) -> Result<(u128, u128)> {
  if reserve_base == 0 && reserve_quote == 0 {
    return Ok((desired_base, desired_quote));
  }
  let quote_optimal = quote(desired_base, reserve_base, reserve_quote)?;
  if quote_optimal <= desired_quote {
    Ok((desired_base, quote_optimal))
  } else {
    let base_optimal = quote(desired_quote, reserve_quote, reserve_base)?;
    Ok((base_optimal, desired_quote))
  }
}

/// LP owed to the protocol for invariant growth since `k_last`.
pub fn protocol_fee_liquidity(
  reserve_base: u128,
  reserve_quote: u128,
  total_supply: u128,
  k_last: U256,
) -> Result<u128> {
  if k_last.is_zero() {
    return Ok(0);
  }
  let root_k = sqrt_floor(product(reserve_base, reserve_quote));
  let root_k_last = sqrt_floor(k_last);
  if root_k <= root_k_last {
    return Ok(0);
  }
  let numerator = U256::from(total_supply)
    .checked_mul(root_k - root_k_last)
    .ok_or(ArithmeticOverflow)?;
  let denominator = root_k
    .checked_mul(U256::from(5))
    .and_then(|d| d.checked_add(root_k_last))
    .ok_or(ArithmeticOverflow)?;
  narrow(numerator / denominator).ok_or(ArithmeticOverflow.into())
}

impl PairState {
  /// Spot price of base in quote units, with `decimals` places.
  pub fn price(&self, decimals: u8) -> Result<u128> {
    pool_price(self.reserve_base, self.reserve_quote, decimals)
  }

  /// Constant-product invariant `reserve_base * reserve_quote`.
  #[must_use]
  pub fn invariant(&self) -> U256 {
    product(self.reserve_base, self.reserve_quote)
  }

  /// Reserves ordered as `(in, out)` for the given swap side.
  #[must_use]
  pub fn oriented(&self, side: SwapSide) -> (u128, u128) {
    match side {
      SwapSide::BaseToQuote => (self.reserve_base, self.reserve_quote),
      SwapSide::QuoteToBase => (self.reserve_quote, self.reserve_base),
    }
  }

  /// Applies an exact-input swap.
  pub fn swap(&self, side: SwapSide, amount_in: u128) -> Result<SwapResult> {
    let (reserve_in, reserve_out) = self.oriented(side);
    let amount_out =
      get_amount_out(amount_in, reserve_in, reserve_out, self.swap_fee)?;
    if amount_out == 0 {
      return Err(InsufficientOutputAmount.into());
    }
    let next_in = reserve_in.checked_add(amount_in).ok_or(ArithmeticOverflow)?;
    let next_out = reserve_out
      .checked_sub(amount_out)
      .ok_or(InsufficientOutputAmount)?;
    let pair = match side {
      SwapSide::BaseToQuote => PairState {
        reserve_base: next_in,
        reserve_quote: next_out,
        ..*self
      },
      SwapSide::QuoteToBase => PairState {
        reserve_base: next_out,
        reserve_quote: next_in,
        ..*self
      },
    };
    Ok(SwapResult { pair, amount_out })
  }

  /// Mints the accrued protocol fee, or clears `k_last` when the fee is off.
  fn accrue_protocol_fee(&self) -> Result<(PairState, u128)> {
    if self.fee_on {
      let fee_liquidity = protocol_fee_liquidity(
        self.reserve_base,
        self.reserve_quote,
        self.total_supply,
        self.k_last,
      )?;
      let total_supply = self
        .total_supply
        .checked_add(fee_liquidity)
        .ok_or(ArithmeticOverflow)?;
      Ok((
        PairState {
          total_supply,
          ..*self
        },
        fee_liquidity,
      ))
    } else {
      Ok((
        PairState {
          k_last: U256::zero(),
          ..*self
        },
        0,
      ))
    }
  }

  /// Burns `liquidity` and pays out the proportional reserves.
  /// The protocol fee is minted first, so it dilutes the share being burned.
  pub fn burn(&self, liquidity: u128) -> Result<BurnResult> {
    let (accrued, protocol_fee_liquidity) = self.accrue_protocol_fee()?;
    if accrued.total_supply == 0 {
      return Err(DivisionByZero.into());
    }
    if liquidity > accrued.total_supply {
      return Err(InsufficientLiquidityBurned.into());
    }
    let amount_base =
      mul_div_floor(liquidity, accrued.reserve_base, accrued.total_supply)?;
    let amount_quote =
      mul_div_floor(liquidity, accrued.reserve_quote, accrued.total_supply)?;
    if amount_base == 0 || amount_quote == 0 {
      return Err(InsufficientLiquidityBurned.into());
    }
    let mut pair = PairState {
      reserve_base: accrued.reserve_base - amount_base,
      reserve_quote: accrued.reserve_quote - amount_quote,
      total_supply: accrued.total_supply - liquidity,
      ..accrued
    };
    if pair.fee_on {
      pair.k_last = pair.invariant();
    }
    Ok(BurnResult {
      pair,
      amount_base,
      amount_quote,
      protocol_fee_liquidity,
    })
  }

  /// Deposits exactly `amount_base` and `amount_quote`.
  pub fn mint(
    &self,
    amount_base: u128,
    amount_quote: u128,
  ) -> Result<MintResult> {
    let (accrued, protocol_fee_liquidity) = self.accrue_protocol_fee()?;
    let liquidity = if accrued.total_supply == 0 {
      narrow(sqrt_floor(product(amount_base, amount_quote)))
        .ok_or(ArithmeticOverflow)?
        .checked_sub(MINIMUM_LIQUIDITY)
        .ok_or(InsufficientLiquidityMinted)?
    } else {
      let by_base =
        mul_div_floor(amount_base, accrued.total_supply, accrued.reserve_base)?;
      let by_quote = mul_div_floor(
        amount_quote,
        accrued.total_supply,
        accrued.reserve_quote,
      )?;
      by_base.min(by_quote)
    };
    if liquidity == 0 {
      return Err(InsufficientLiquidityMinted.into());
    }
    // The locked minimum is part of the supply on first mint.
    let minted_supply = if accrued.total_supply == 0 {
      liquidity + MINIMUM_LIQUIDITY
    } else {
      liquidity
    };
    let mut pair = PairState {
      reserve_base: accrued
        .reserve_base
        .checked_add(amount_base)
        .ok_or(ArithmeticOverflow)?,
      reserve_quote: accrued
        .reserve_quote
        .checked_add(amount_quote)
        .ok_or(ArithmeticOverflow)?,
      total_supply: accrued
        .total_supply
        .checked_add(minted_supply)
        .ok_or(ArithmeticOverflow)?,
      ..accrued
    };
    if pair.fee_on {
      pair.k_last = pair.invariant();
    }
    Ok(MintResult {
      pair,
      liquidity,
      protocol_fee_liquidity,
    })
  }
}
