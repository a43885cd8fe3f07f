use anchor_lang::prelude::Clock;

/// Abstracts the concept of Solana's onchain clock.
pub trait SolanaClock {
  fn slot(&self) -> u64;
  fn unix_timestamp(&self) -> i64;
}

impl SolanaClock for Clock {
  fn slot(&self) -> u64 {
    self.slot
  }

  fn unix_timestamp(&self) -> i64 {
    self.unix_timestamp
  }
}

/// Clock pinned to a fixed slot and time, for simulations and tests.
#[cfg(any(test, feature = "simulation"))]
#[derive(Copy, Clone, Debug, Default)]
pub struct FixedClock {
  pub slot: u64,
  pub unix_timestamp: i64,
}

#[cfg(any(test, feature = "simulation"))]
impl FixedClock {
  #[must_use]
  pub fn new(slot: u64, unix_timestamp: i64) -> FixedClock {
    FixedClock {
      slot,
      unix_timestamp,
    }
  }

  /// Same clock moved forward by `slots` at 400ms per slot.
  #[must_use]
  pub fn advance(&self, slots: u64) -> FixedClock {
    let millis = i64::try_from(slots.saturating_mul(400)).unwrap_or(i64::MAX);
    FixedClock {
      slot: self.slot.saturating_add(slots),
      unix_timestamp: self.unix_timestamp.saturating_add(millis / 1000),
    }
  }
}

#[cfg(any(test, feature = "simulation"))]
impl SolanaClock for FixedClock {
  fn slot(&self) -> u64 {
    self.slot
  }

  fn unix_timestamp(&self) -> i64 {
    self.unix_timestamp
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anchor_clock_fields() {
    let clock = Clock {
      slot: 42,
      unix_timestamp: 1_700_000_000,
      ..Clock::default()
    };
    assert_eq!(SolanaClock::slot(&clock), 42);
    assert_eq!(SolanaClock::unix_timestamp(&clock), 1_700_000_000);
  }

  #[test]
  fn fixed_clock_advances() {
    let clock = FixedClock::new(100, 1_000).advance(25);
    assert_eq!(clock.slot(), 125);
    assert_eq!(clock.unix_timestamp(), 1_010);
  }
}
