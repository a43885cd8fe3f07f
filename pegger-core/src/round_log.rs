use anchor_lang::prelude::*;
use serde::{Deserialize, Serialize};

/// One executed intervention.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  AnchorSerialize,
  AnchorDeserialize,
  Serialize,
  Deserialize,
)]
pub struct RoundRecord {
  pub round_number: u64,
  /// Target price the round was executed for.
  pub price: u128,
  pub timestamp: i64,
}

/// Append-only history of executed rounds, numbered from 1.
#[derive(Debug, Clone, Default, AnchorSerialize, AnchorDeserialize)]
pub struct RoundLog {
  records: Vec<RoundRecord>,
}

impl RoundLog {
  #[must_use]
  pub fn new() -> RoundLog {
    RoundLog::default()
  }

  /// Zero until the first round executes.
  #[must_use]
  pub fn last_round_number(&self) -> u64 {
    self.last().map_or(0, |record| record.round_number)
  }

  #[must_use]
  pub fn last(&self) -> Option<&RoundRecord> {
    self.records.last()
  }

  #[must_use]
  pub fn records(&self) -> &[RoundRecord] {
    &self.records
  }

  /// Records a round under the next number.
  pub fn append(&mut self, price: u128, timestamp: i64) -> &RoundRecord {
    let round_number = self.last_round_number() + 1;
    self.records.push(RoundRecord {
      round_number,
      price,
      timestamp,
    });
    &self.records[self.records.len() - 1]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_log() {
    let log = RoundLog::new();
    assert_eq!(log.last_round_number(), 0);
    assert!(log.last().is_none());
    assert!(log.records().is_empty());
  }

  #[test]
  fn rounds_increment_by_one() {
    let mut log = RoundLog::new();
    let first = *log.append(2_000_000, 100);
    let second = *log.append(2_500_000, 160);
    assert_eq!(first.round_number, 1);
    assert_eq!(second.round_number, 2);
    assert_eq!(log.last_round_number(), 2);
    assert_eq!(log.last(), Some(&second));
    assert_eq!(log.records(), &[first, second]);
  }

  #[test]
  fn record_json_shape() -> anyhow::Result<()> {
    let record = RoundRecord {
      round_number: 3,
      price: 1_500_000,
      timestamp: 1_700_000_000,
    };
    let json = serde_json::to_value(record)?;
    assert_eq!(
      json,
      serde_json::json!({
        "round_number": 3,
        "price": 1_500_000,
        "timestamp": 1_700_000_000,
      })
    );
    let back: RoundRecord = serde_json::from_value(json)?;
    assert_eq!(back, record);
    Ok(())
  }
}
