//! Peg intervention state machine.
//!
//! A round reads a fresh pool snapshot, measures the distance to the target
//! price, runs it through the threshold gate and, if allowed, executes
//! remove, swap, re-add against the pool. Execution happens on a clone of the
//! pool that replaces the caller's pool only when every step succeeded.

use anchor_lang::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calibrator::{
  estimate_add, plan_intervention, InterventionPlan, NowEstimate,
};
use crate::error::PegError::{
  AdminOnly, ArithmeticOverflow, ConfigUnsetKey, DegenerateFeedPrice,
  EmergencyThreshold, InsufficientBalance, Paused, Unauthorized,
  UnpauseNotAdmin, VolatilityThreshold,
};
use crate::error::PegError;
use crate::liquidity_amount::compute_xlp_for_direction;
use crate::pair_math::SwapSide;
use crate::peg_config::PegConfig;
use crate::pool::{Asset, PegPool};
use crate::price_feed::PriceFeed;
use crate::price_ratio::{p_ratio_for_move, Direction};
use crate::round_log::{RoundLog, RoundRecord};
use crate::solana_clock::SolanaClock;
use crate::threshold_gate::GateDecision;
use crate::util::display_amount;

/// Privileged roles. Either may pause; only the admin may unpause or
/// reconfigure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
  Admin,
  Keeper,
}

/// Why a permitted call left the pool untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
  /// Pool price already equals the target.
  NoDelta,
  /// Deviation below the frontrun threshold.
  BelowFrontrun,
}

/// What an executed round did.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionReport {
  pub round: RoundRecord,
  pub direction: Direction,
  pub p_ratio: u128,
  pub price_before: u128,
  pub price_after: u128,
  /// LP pulled from the vault and burned.
  pub lp_amount: u128,
  pub removed_base: u128,
  pub removed_quote: u128,
  pub swap_side: Option<SwapSide>,
  pub amount_in: u128,
  pub amount_out: u128,
  /// LP re-minted to the vault.
  pub lp_minted: u128,
  pub leftover_base: u128,
  pub leftover_quote: u128,
  /// Whether the swap alone was enough to reach the target.
  pub reaches_target: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterventionOutcome {
  Skipped(SkipReason),
  Executed(InterventionReport),
}

#[derive(Clone, Debug)]
pub struct PegController {
  /// Account the controller acts as: spender of the vault's LP allowance and
  /// transient holder of withdrawn tokens.
  authority: Pubkey,
  config: PegConfig,
  paused: bool,
  rounds: RoundLog,
}

impl PegController {
  /// Starts active with an empty round log.
  pub fn new(authority: Pubkey, config: PegConfig) -> Result<PegController> {
    if authority == Pubkey::default() {
      return Err(ConfigUnsetKey.into());
    }
    config.validate()?;
    Ok(PegController {
      authority,
      config,
      paused: false,
      rounds: RoundLog::new(),
    })
  }

  #[must_use]
  pub fn authority(&self) -> Pubkey {
    self.authority
  }

  #[must_use]
  pub fn config(&self) -> &PegConfig {
    &self.config
  }

  #[must_use]
  pub fn is_paused(&self) -> bool {
    self.paused
  }

  #[must_use]
  pub fn last_round_number(&self) -> u64 {
    self.rounds.last_round_number()
  }

  #[must_use]
  pub fn last_round(&self) -> Option<&RoundRecord> {
    self.rounds.last()
  }

  #[must_use]
  pub fn rounds(&self) -> &[RoundRecord] {
    self.rounds.records()
  }

  #[must_use]
  pub fn role_of(&self, caller: &Pubkey) -> Option<Role> {
    if *caller == self.config.admin {
      Some(Role::Admin)
    } else if *caller == self.config.keeper {
      Some(Role::Keeper)
    } else {
      None
    }
  }

  #[must_use]
  pub fn can_pause(&self, caller: &Pubkey) -> bool {
    matches!(self.role_of(caller), Some(Role::Admin | Role::Keeper))
  }

  #[must_use]
  pub fn can_unpause(&self, caller: &Pubkey) -> bool {
    matches!(self.role_of(caller), Some(Role::Admin))
  }

  /// Any role may trigger interventions.
  fn authorize(&self, caller: &Pubkey) -> Result<Role> {
    self.role_of(caller).ok_or(Unauthorized.into())
  }

  /// Admin passes, keeper gets `keeper_error`, anyone else `Unauthorized`.
  fn require_admin(
    &self,
    caller: &Pubkey,
    keeper_error: PegError,
  ) -> Result<()> {
    match self.role_of(caller) {
      Some(Role::Admin) => Ok(()),
      Some(Role::Keeper) => Err(keeper_error.into()),
      None => Err(Unauthorized.into()),
    }
  }

  fn trip(&mut self, reason: &str) {
    self.paused = true;
    msg!("pegger: paused ({})", reason);
  }

  pub fn pause(&mut self, caller: &Pubkey) -> Result<()> {
    if self.can_pause(caller) {
      self.trip("manual");
      Ok(())
    } else {
      Err(Unauthorized.into())
    }
  }

  pub fn unpause(&mut self, caller: &Pubkey) -> Result<()> {
    self.require_admin(caller, UnpauseNotAdmin)?;
    self.paused = false;
    msg!("pegger: unpaused");
    Ok(())
  }

  /// Replaces the whole configuration after validating it.
  pub fn update_config(
    &mut self,
    caller: &Pubkey,
    config: PegConfig,
  ) -> Result<()> {
    self.require_admin(caller, AdminOnly)?;
    config.validate()?;
    self.config = config;
    msg!(
      "pegger: config updated, thresholds {}/{}/{}",
      display_amount(config.thresholds.frontrun, config.decimals),
      display_amount(config.thresholds.volatility, config.decimals),
      display_amount(config.thresholds.emergency, config.decimals),
    );
    Ok(())
  }

  pub fn update_admin(
    &mut self,
    caller: &Pubkey,
    admin: Pubkey,
  ) -> Result<()> {
    self.require_admin(caller, AdminOnly)?;
    self.config = self.config.with_admin(admin)?;
    msg!("pegger: admin rotated to {}", admin);
    Ok(())
  }

  pub fn update_keeper(
    &mut self,
    caller: &Pubkey,
    keeper: Pubkey,
  ) -> Result<()> {
    self.require_admin(caller, AdminOnly)?;
    self.config = self.config.with_keeper(keeper)?;
    msg!("pegger: keeper rotated to {}", keeper);
    Ok(())
  }

  /// Moves the pool price toward `target_price`.
  ///
  /// Checked in order: caller role, pause state, zero target (pauses),
  /// direction, threshold gate. A rejection by the emergency gate or a zero
  /// target leaves the controller paused even though the call fails.
  pub fn call_intervention<P: PegPool, C: SolanaClock>(
    &mut self,
    caller: &Pubkey,
    pool: &mut P,
    clock: &C,
    target_price: u128,
  ) -> Result<InterventionOutcome> {
    self.authorize(caller)?;
    if self.paused {
      return Err(Paused.into());
    }
    if target_price == 0 {
      self.trip("zero target price");
      return Err(DegenerateFeedPrice.into());
    }

    let decimals = self.config.decimals;
    let snapshot = pool.pair_state();
    let price_before = snapshot.price(decimals)?;
    let Some((direction, p_ratio)) =
      p_ratio_for_move(price_before, target_price, decimals)?
    else {
      msg!(
        "pegger: pool already at {}",
        display_amount(target_price, decimals)
      );
      return Ok(InterventionOutcome::Skipped(SkipReason::NoDelta));
    };

    let decision = self.config.thresholds.gate(p_ratio);
    msg!(
      "pegger: {} {} -> {}, p_ratio {}: {}",
      direction,
      display_amount(price_before, decimals),
      display_amount(target_price, decimals),
      display_amount(p_ratio, decimals),
      decision,
    );
    match decision {
      GateDecision::Emergency => {
        self.trip("emergency threshold");
        return Err(EmergencyThreshold.into());
      }
      GateDecision::Volatile => return Err(VolatilityThreshold.into()),
      GateDecision::BelowFrontrun => {
        return Ok(InterventionOutcome::Skipped(SkipReason::BelowFrontrun))
      }
      GateDecision::Proceed => {}
    }

    let lp_amount = compute_xlp_for_direction(
      snapshot.reserve_base,
      snapshot.reserve_quote,
      price_before,
      target_price,
      direction,
      snapshot.total_supply,
      decimals,
    )?;
    let plan = plan_intervention(
      &snapshot,
      direction,
      target_price,
      decimals,
      lp_amount,
    )?;

    let mut staged = pool.clone();
    let executed = self.execute(&mut staged, &plan)?;
    let price_after = executed.pair.price(decimals)?;
    *pool = staged;

    let round = *self.rounds.append(target_price, clock.unix_timestamp());
    msg!(
      "pegger: round {} at slot {}, price {} -> {}, lp {} out {} in",
      round.round_number,
      clock.slot(),
      display_amount(price_before, decimals),
      display_amount(price_after, decimals),
      lp_amount,
      executed.lp_minted,
    );
    Ok(InterventionOutcome::Executed(InterventionReport {
      round,
      direction,
      p_ratio,
      price_before,
      price_after,
      lp_amount,
      removed_base: executed.removed_base,
      removed_quote: executed.removed_quote,
      swap_side: plan.swap.map(|leg| leg.side),
      amount_in: plan.swap.map_or(0, |leg| leg.amount_in),
      amount_out: executed.amount_out,
      lp_minted: executed.lp_minted,
      leftover_base: executed.leftover_base,
      leftover_quote: executed.leftover_quote,
      reaches_target: plan.reaches_target,
    }))
  }

  /// Reads the target from `feed` and runs [`Self::call_intervention`].
  pub fn call_intervention_from_feed<P, F, C>(
    &mut self,
    caller: &Pubkey,
    pool: &mut P,
    feed: &F,
    clock: &C,
  ) -> Result<InterventionOutcome>
  where
    P: PegPool,
    F: PriceFeed,
    C: SolanaClock,
  {
    self.authorize(caller)?;
    let target_price = feed.latest_price()?;
    self.call_intervention(caller, pool, clock, target_price)
  }

  /// Pulls LP from the vault, burns it, swaps, re-deposits to the vault and
  /// returns leftovers to the vault. Reports the same quantities the plan's
  /// estimate predicts.
  fn execute<P: PegPool>(
    &self,
    pool: &mut P,
    plan: &InterventionPlan,
  ) -> Result<NowEstimate> {
    let vault = self.config.vault;
    let holder = self.authority;

    pool.transfer_lp_from(&holder, &vault, &holder, plan.lp_amount)?;
    let (removed_base, removed_quote) = pool.burn(&holder, plan.lp_amount)?;

    let mut held_base = removed_base;
    let mut held_quote = removed_quote;
    let mut amount_out = 0;
    if let Some(leg) = plan.swap {
      amount_out = pool.swap(&holder, leg.side, leg.amount_in)?;
      let (spent, gained) = match leg.side {
        SwapSide::BaseToQuote => (&mut held_base, &mut held_quote),
        SwapSide::QuoteToBase => (&mut held_quote, &mut held_base),
      };
      *spent = spent
        .checked_sub(leg.amount_in)
        .ok_or(InsufficientBalance)?;
      *gained = gained.checked_add(amount_out).ok_or(ArithmeticOverflow)?;
    }

    let (lp_minted, leftover_base, leftover_quote) =
      match estimate_add(&pool.pair_state(), held_base, held_quote)? {
        Some(add) => {
          let minted =
            pool.mint(&holder, &vault, add.amount_base, add.amount_quote)?;
          (minted, add.leftover_base, add.leftover_quote)
        }
        None => (0, held_base, held_quote),
      };
    if leftover_base > 0 {
      pool.transfer(&holder, &vault, Asset::Base, leftover_base)?;
    }
    if leftover_quote > 0 {
      pool.transfer(&holder, &vault, Asset::Quote, leftover_quote)?;
    }

    Ok(NowEstimate {
      pair: pool.pair_state(),
      removed_base,
      removed_quote,
      amount_out,
      lp_minted,
      leftover_base,
      leftover_quote,
    })
  }
}
