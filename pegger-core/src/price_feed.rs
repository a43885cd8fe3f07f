//! Reference price source for feed-driven interventions.
//!
//! Anything that can report a single latest price at the controller's
//! configured decimals implements [`PriceFeed`], so an on-chain oracle reader
//! and a test double are interchangeable.

use anchor_lang::prelude::Result;

/// Latest reference ("peg") price, raw fixed-point at the configured decimals.
pub trait PriceFeed {
  fn latest_price(&self) -> Result<u128>;
}

/// Feed that always reports the same price.
#[cfg(any(test, feature = "simulation"))]
#[derive(Copy, Clone, Debug)]
pub struct FixedPriceFeed(pub u128);

#[cfg(any(test, feature = "simulation"))]
impl PriceFeed for FixedPriceFeed {
  fn latest_price(&self) -> Result<u128> {
    Ok(self.0)
  }
}
