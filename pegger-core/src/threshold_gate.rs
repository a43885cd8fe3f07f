use crate::error::PegError::ConfigThresholdOrder;
use crate::threshold_gate::GateDecision::{
  BelowFrontrun, Emergency, Proceed, Volatile,
};

use anchor_lang::prelude::*;

use std::fmt::Display;

/// What the controller does with a price move of a given pRatio.
#[derive(
  Copy, Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq, Eq,
)]
pub enum GateDecision {
  Proceed,
  BelowFrontrun,
  Volatile,
  Emergency,
}

impl Display for GateDecision {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Proceed => f.write_str("Proceed"),
      BelowFrontrun => f.write_str("BelowFrontrun"),
      Volatile => f.write_str("Volatile"),
      Emergency => f.write_str("Emergency"),
    }
  }
}

/// Ordered deviation limits, all in pRatio units (`10^decimals` = 100%).
#[derive(
  Copy, Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq, Eq,
)]
pub struct Thresholds {
  pub emergency: u128,
  pub volatility: u128,
  pub frontrun: u128,
}

impl Thresholds {
  /// Parses thresholds, rejecting any ordering other than
  /// `0 < frontrun < volatility < emergency`.
  pub fn new(
    emergency: u128,
    volatility: u128,
    frontrun: u128,
  ) -> Result<Thresholds> {
    let thresholds = Thresholds {
      emergency,
      volatility,
      frontrun,
    };
    thresholds.validate()?;
    Ok(thresholds)
  }

  /// Classifies a pRatio, first match wins:
  ///   - `>= emergency`: reject and pause
  ///   - `>= volatility`: reject
  ///   - `< frontrun`: no-op
  ///   - otherwise proceed, so `frontrun` itself proceeds
  #[must_use]
  pub fn gate(&self, p_ratio: u128) -> GateDecision {
    if p_ratio >= self.emergency {
      Emergency
    } else if p_ratio >= self.volatility {
      Volatile
    } else if p_ratio < self.frontrun {
      BelowFrontrun
    } else {
      Proceed
    }
  }

  pub fn validate(&self) -> Result<()> {
    let Thresholds {
      emergency,
      volatility,
      frontrun,
    } = *self;
    if frontrun > 0 && frontrun < volatility && volatility < emergency {
      Ok(())
    } else {
      Err(ConfigThresholdOrder.into())
    }
  }
}
