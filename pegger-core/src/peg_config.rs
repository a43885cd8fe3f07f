use anchor_lang::prelude::*;

use crate::error::PegError::{
  ConfigDecimals, ConfigRoleOverlap, ConfigThresholdScale, ConfigUnsetKey,
};
use crate::fixed_point::{scale, MAX_DECIMALS};
use crate::threshold_gate::Thresholds;

/// Controller configuration, validated on construction and on every update.
#[derive(
  Copy, Clone, Debug, AnchorSerialize, AnchorDeserialize, PartialEq, Eq,
)]
pub struct PegConfig {
  pub admin: Pubkey,
  pub keeper: Pubkey,
  pub price_feed: Pubkey,
  pub pool: Pubkey,
  /// Holder of the LP position the controller withdraws from.
  pub vault: Pubkey,
  pub base_token: Pubkey,
  pub thresholds: Thresholds,
  /// Exponent shared by prices, pRatio and thresholds.
  pub decimals: u8,
}

impl PegConfig {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    admin: Pubkey,
    keeper: Pubkey,
    price_feed: Pubkey,
    pool: Pubkey,
    vault: Pubkey,
    base_token: Pubkey,
    thresholds: Thresholds,
    decimals: u8,
  ) -> Result<PegConfig> {
    let config = PegConfig {
      admin,
      keeper,
      price_feed,
      pool,
      vault,
      base_token,
      thresholds,
      decimals,
    };
    config.validate()?;
    Ok(config)
  }

  fn keys(&self) -> [Pubkey; 6] {
    [
      self.admin,
      self.keeper,
      self.price_feed,
      self.pool,
      self.vault,
      self.base_token,
    ]
  }

  /// Checks references are set, roles are distinct, decimals fit the
  /// fixed-point path and thresholds are ordered.
  ///
  /// An Up pRatio never reaches `10^decimals`, so the emergency threshold
  /// must sit below it to pause on price-raising moves as well.
  pub fn validate(&self) -> Result<()> {
    if self.keys().iter().any(|key| *key == Pubkey::default()) {
      Err(ConfigUnsetKey.into())
    } else if self.admin == self.keeper {
      Err(ConfigRoleOverlap.into())
    } else if self.decimals == 0 || self.decimals > MAX_DECIMALS {
      Err(ConfigDecimals.into())
    } else {
      self.thresholds.validate()?;
      if self.thresholds.emergency >= scale(self.decimals)? {
        Err(ConfigThresholdScale.into())
      } else {
        Ok(())
      }
    }
  }

  /// Replaces the admin key, keeping the rest of the configuration.
  pub fn with_admin(&self, admin: Pubkey) -> Result<PegConfig> {
    let next = PegConfig { admin, ..*self };
    next.validate()?;
    Ok(next)
  }

  /// Replaces the keeper key, keeping the rest of the configuration.
  pub fn with_keeper(&self, keeper: Pubkey) -> Result<PegConfig> {
    let next = PegConfig { keeper, ..*self };
    next.validate()?;
    Ok(next)
  }
}


#[cfg(test)]
mod tests {
  use super::fixtures::config;
  use super::*;
  use crate::error::PegError::ConfigThresholdOrder;

  #[test]
  fn valid_config() -> Result<()> {
    let config = config()?;
    assert_eq!(config.decimals, 6);
    config.validate()
  }

  #[test]
  fn reject_unset_key() -> Result<()> {
    let config = PegConfig {
      vault: Pubkey::default(),
      ..config()?
    };
    assert!(config.validate().is_err_and(|e| e == ConfigUnsetKey.into()));
    Ok(())
  }

  #[test]
  fn reject_shared_admin_keeper() -> Result<()> {
    let base = config()?;
    let result = base.with_keeper(base.admin);
    assert!(result.is_err_and(|e| e == ConfigRoleOverlap.into()));
    Ok(())
  }

  #[test]
  fn reject_decimals_out_of_range() -> Result<()> {
    let zero = PegConfig {
      decimals: 0,
      ..config()?
    };
    let wide = PegConfig {
      decimals: MAX_DECIMALS + 1,
      ..config()?
    };
    assert!(zero.validate().is_err_and(|e| e == ConfigDecimals.into()));
    assert!(wide.validate().is_err_and(|e| e == ConfigDecimals.into()));
    Ok(())
  }

  #[test]
  fn reject_misordered_thresholds() -> Result<()> {
    let config = PegConfig {
      thresholds: Thresholds {
        emergency: 500_000,
        volatility: 10_000,
        frontrun: 20_000,
      },
      ..config()?
    };
    let result = config.validate();
    assert!(result.is_err_and(|e| e == ConfigThresholdOrder.into()));
    Ok(())
  }

  #[test]
  fn emergency_below_full_scale() -> Result<()> {
    let base = config()?;
    let at_bound = PegConfig {
      thresholds: Thresholds::new(999_999, 300_000, 20_000)?,
      ..base
    };
    at_bound.validate()?;
    let full = PegConfig {
      thresholds: Thresholds::new(1_000_000, 300_000, 20_000)?,
      ..base
    };
    let result = full.validate();
    assert!(result.is_err_and(|e| e == ConfigThresholdScale.into()));
    Ok(())
  }

  #[test]
  fn emergency_bound_follows_decimals() -> Result<()> {
    let wide = PegConfig {
      thresholds: Thresholds::new(2_000_000, 300_000, 20_000)?,
      decimals: 7,
      ..config()?
    };
    wide.validate()?;
    let narrow = PegConfig {
      decimals: 6,
      ..wide
    };
    let result = narrow.validate();
    assert!(result.is_err_and(|e| e == ConfigThresholdScale.into()));
    Ok(())
  }

  #[test]
  fn rotate_admin() -> Result<()> {
    let base = config()?;
    let admin = Pubkey::new_unique();
    let rotated = base.with_admin(admin)?;
    assert_eq!(rotated.admin, admin);
    assert_eq!(rotated.keeper, base.keeper);
    Ok(())
  }
}
