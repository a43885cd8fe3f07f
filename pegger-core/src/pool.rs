use anchor_lang::prelude::*;
use fix::prelude::*;
use primitive_types::U256;

use crate::pair_math::{PairState, SwapSide};

/// Token held against a pool.
#[derive(
  Copy,
  Clone,
  Debug,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  AnchorSerialize,
  AnchorDeserialize,
)]
pub enum Asset {
  Base,
  Quote,
  Lp,
}

/// Constant-product pool the controller intervenes on.
///
/// Mutations take effect immediately on `self`. The controller runs a full
/// intervention on a clone and writes the clone back only once every step
/// succeeded, so implementations need no rollback of their own.
pub trait PegPool: Clone {
  /// `(reserve_base, reserve_quote)`.
  fn reserves(&self) -> (u128, u128);
  fn total_supply(&self) -> u128;
  /// Invariant recorded at the last liquidity event, zero when the protocol
  /// fee is off.
  fn k_last(&self) -> U256;
  fn fee_on(&self) -> bool;
  fn swap_fee(&self) -> UFix64<N4>;

  fn balance_of(&self, owner: &Pubkey, asset: Asset) -> u128;
  fn lp_allowance(&self, owner: &Pubkey, spender: &Pubkey) -> u128;

  fn approve_lp(
    &mut self,
    owner: &Pubkey,
    spender: &Pubkey,
    amount: u128,
  ) -> Result<()>;

  /// Moves LP out of `from` on behalf of `spender`, spending allowance.
  fn transfer_lp_from(
    &mut self,
    spender: &Pubkey,
    from: &Pubkey,
    to: &Pubkey,
    amount: u128,
  ) -> Result<()>;

  /// Burns LP held by `owner`, paying `(base, quote)` back to `owner`.
  fn burn(&mut self, owner: &Pubkey, liquidity: u128) -> Result<(u128, u128)>;

  /// Exact-input swap from `owner`'s balance, returning the output amount.
  fn swap(
    &mut self,
    owner: &Pubkey,
    side: SwapSide,
    amount_in: u128,
  ) -> Result<u128>;

  /// Deposits exactly `amount_base` and `amount_quote` from `owner`, minting
  /// LP to `to`.
  fn mint(
    &mut self,
    owner: &Pubkey,
    to: &Pubkey,
    amount_base: u128,
    amount_quote: u128,
  ) -> Result<u128>;

  fn transfer(
    &mut self,
    owner: &Pubkey,
    to: &Pubkey,
    asset: Asset,
    amount: u128,
  ) -> Result<()>;

  /// Fresh snapshot for the pure pair math.
  fn pair_state(&self) -> PairState {
    let (reserve_base, reserve_quote) = self.reserves();
    PairState {
      reserve_base,
      reserve_quote,
      total_supply: self.total_supply(),
      k_last: self.k_last(),
      fee_on: self.fee_on(),
      swap_fee: self.swap_fee(),
    }
  }
}
