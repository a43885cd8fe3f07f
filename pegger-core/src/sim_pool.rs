//! In-memory constant-product pair with token and LP ledgers.
//!
//! State transitions go through [`crate::pair_math`], so the pool executes
//! with the same rounding the calibrator estimates with.

use anchor_lang::prelude::*;
use fix::prelude::*;
use primitive_types::U256;

use std::collections::BTreeMap;

use crate::error::PegError::{
  ArithmeticOverflow, InsufficientAllowance, InsufficientBalance, ZeroAmount,
};
use crate::pair_math::{PairState, SwapSide, MINIMUM_LIQUIDITY};
use crate::pool::{Asset, PegPool};

#[derive(Clone, Debug)]
pub struct SimPool {
  pair: PairState,
  /// Receives LP minted for the protocol fee.
  fee_to: Pubkey,
  balances: BTreeMap<(Pubkey, Asset), u128>,
  allowances: BTreeMap<(Pubkey, Pubkey), u128>,
}

impl SimPool {
  /// Empty pool. `fee_to` set means the protocol fee switch is on.
  #[must_use]
  pub fn new(swap_fee: UFix64<N4>, fee_to: Option<Pubkey>) -> SimPool {
    SimPool {
      pair: PairState {
        reserve_base: 0,
        reserve_quote: 0,
        total_supply: 0,
        k_last: U256::zero(),
        fee_on: fee_to.is_some(),
        swap_fee,
      },
      fee_to: fee_to.unwrap_or_default(),
      balances: BTreeMap::new(),
      allowances: BTreeMap::new(),
    }
  }

  /// Holder of the permanently locked first-deposit LP.
  #[must_use]
  pub fn lock_address() -> Pubkey {
    Pubkey::default()
  }

  /// Mints test tokens straight into a holder's balance.
  pub fn credit(
    &mut self,
    owner: &Pubkey,
    asset: Asset,
    amount: u128,
  ) -> Result<()> {
    let entry = self.balances.entry((*owner, asset)).or_insert(0);
    *entry = entry.checked_add(amount).ok_or(ArithmeticOverflow)?;
    Ok(())
  }

  fn debit(
    &mut self,
    owner: &Pubkey,
    asset: Asset,
    amount: u128,
  ) -> Result<()> {
    let balance = self.balance_of(owner, asset);
    let next = balance.checked_sub(amount).ok_or(InsufficientBalance)?;
    self.balances.insert((*owner, asset), next);
    Ok(())
  }

  fn credit_protocol_fee(&mut self, liquidity: u128) -> Result<()> {
    if liquidity > 0 {
      let fee_to = self.fee_to;
      self.credit(&fee_to, Asset::Lp, liquidity)?;
    }
    Ok(())
  }

  /// Credits `provider` with both tokens and deposits them.
  pub fn seed(
    &mut self,
    provider: &Pubkey,
    amount_base: u128,
    amount_quote: u128,
  ) -> Result<u128> {
    self.credit(provider, Asset::Base, amount_base)?;
    self.credit(provider, Asset::Quote, amount_quote)?;
    self.mint(provider, provider, amount_base, amount_quote)
  }
}

impl PegPool for SimPool {
  fn reserves(&self) -> (u128, u128) {
    (self.pair.reserve_base, self.pair.reserve_quote)
  }

  fn total_supply(&self) -> u128 {
    self.pair.total_supply
  }

  fn k_last(&self) -> U256 {
    self.pair.k_last
  }

  fn fee_on(&self) -> bool {
    self.pair.fee_on
  }

  fn swap_fee(&self) -> UFix64<N4> {
    self.pair.swap_fee
  }

  fn balance_of(&self, owner: &Pubkey, asset: Asset) -> u128 {
    self.balances.get(&(*owner, asset)).copied().unwrap_or(0)
  }

  fn lp_allowance(&self, owner: &Pubkey, spender: &Pubkey) -> u128 {
    self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
  }

  fn approve_lp(
    &mut self,
    owner: &Pubkey,
    spender: &Pubkey,
    amount: u128,
  ) -> Result<()> {
    self.allowances.insert((*owner, *spender), amount);
    Ok(())
  }

  fn transfer_lp_from(
    &mut self,
    spender: &Pubkey,
    from: &Pubkey,
    to: &Pubkey,
    amount: u128,
  ) -> Result<()> {
    let allowance = self.lp_allowance(from, spender);
    let remaining = allowance
      .checked_sub(amount)
      .ok_or(InsufficientAllowance)?;
    self.debit(from, Asset::Lp, amount)?;
    self.credit(to, Asset::Lp, amount)?;
    self.allowances.insert((*from, *spender), remaining);
    Ok(())
  }

  fn burn(&mut self, owner: &Pubkey, liquidity: u128) -> Result<(u128, u128)> {
    let burned = self.pair.burn(liquidity)?;
    self.debit(owner, Asset::Lp, liquidity)?;
    self.credit_protocol_fee(burned.protocol_fee_liquidity)?;
    self.credit(owner, Asset::Base, burned.amount_base)?;
    self.credit(owner, Asset::Quote, burned.amount_quote)?;
    self.pair = burned.pair;
    Ok((burned.amount_base, burned.amount_quote))
  }

  fn swap(
    &mut self,
    owner: &Pubkey,
    side: SwapSide,
    amount_in: u128,
  ) -> Result<u128> {
    let (asset_in, asset_out) = match side {
      SwapSide::BaseToQuote => (Asset::Base, Asset::Quote),
      SwapSide::QuoteToBase => (Asset::Quote, Asset::Base),
    };
    let swapped = self.pair.swap(side, amount_in)?;
    self.debit(owner, asset_in, amount_in)?;
    self.credit(owner, asset_out, swapped.amount_out)?;
    self.pair = swapped.pair;
    Ok(swapped.amount_out)
  }

  fn mint(
    &mut self,
    owner: &Pubkey,
    to: &Pubkey,
    amount_base: u128,
    amount_quote: u128,
  ) -> Result<u128> {
    if amount_base == 0 || amount_quote == 0 {
      return Err(ZeroAmount.into());
    }
    if self.balance_of(owner, Asset::Base) < amount_base
      || self.balance_of(owner, Asset::Quote) < amount_quote
    {
      return Err(InsufficientBalance.into());
    }
    let first_deposit = self.pair.total_supply == 0;
    let minted = self.pair.mint(amount_base, amount_quote)?;
    self.debit(owner, Asset::Base, amount_base)?;
    self.debit(owner, Asset::Quote, amount_quote)?;
    self.credit_protocol_fee(minted.protocol_fee_liquidity)?;
    if first_deposit {
      self.credit(&Self::lock_address(), Asset::Lp, MINIMUM_LIQUIDITY)?;
    }
    self.credit(to, Asset::Lp, minted.liquidity)?;
    self.pair = minted.pair;
    Ok(minted.liquidity)
  }

  fn transfer(
    &mut self,
    owner: &Pubkey,
    to: &Pubkey,
    asset: Asset,
    amount: u128,
  ) -> Result<()> {
    self.debit(owner, asset, amount)?;
    self.credit(to, asset, amount)
  }
}
