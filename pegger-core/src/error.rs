use anchor_lang::error::Error;
use anchor_lang::prelude::error_code;

#[error_code]
pub enum PegError {
  // `controller`
  #[msg("Caller is neither the admin nor the keeper.")]
  Unauthorized = 7000,
  #[msg("Only the admin can lift a pause.")]
  UnpauseNotAdmin,
  #[msg("Only the admin can change the configuration.")]
  AdminOnly,
  #[msg("Interventions are paused.")]
  Paused,
  #[msg("Reference price is zero; controller paused.")]
  DegenerateFeedPrice,
  // `threshold_gate`
  #[msg("Price deviation reached the emergency threshold; controller paused.")]
  EmergencyThreshold,
  #[msg("Price deviation reached the volatility threshold.")]
  VolatilityThreshold,
  // `fixed_point`
  #[msg("Division by zero in fixed-point arithmetic.")]
  DivisionByZero,
  #[msg("Overflow in fixed-point arithmetic.")]
  ArithmeticOverflow,
  #[msg("Pool reserves are zero or inconsistent.")]
  MalformedReserves,
  // `price_ratio`
  #[msg("Price is zero and cannot be used as a ratio denominator.")]
  DegeneratePrice,
  #[msg("Price ratio formula went negative for the given direction.")]
  NegativePRatio,
  // `liquidity_amount`
  #[msg("Requested move needs more LP than the pool supply.")]
  InsufficientLiquidity,
  // `pair_math`
  #[msg("Swap fee must be below 100%.")]
  InvalidSwapFee,
  #[msg("Amount must be greater than zero.")]
  ZeroAmount,
  #[msg("Deposit would mint zero liquidity.")]
  InsufficientLiquidityMinted,
  #[msg("Withdrawal would burn into zero token amounts.")]
  InsufficientLiquidityBurned,
  #[msg("Swap would produce zero output.")]
  InsufficientOutputAmount,
  // `calibrator`
  #[msg("Search range start is above its end.")]
  SearchRange,
  // `pool`
  #[msg("LP allowance from the vault is too small.")]
  InsufficientAllowance,
  #[msg("Holder balance is too small for the transfer.")]
  InsufficientBalance,
  // `peg_config`
  #[msg("Configuration contains a default (unset) pubkey.")]
  ConfigUnsetKey,
  #[msg("Admin and keeper must be distinct keys.")]
  ConfigRoleOverlap,
  #[msg("Thresholds must satisfy 0 < frontrun < volatility < emergency.")]
  ConfigThresholdOrder,
  #[msg("Decimals are out of the supported range.")]
  ConfigDecimals,
  #[msg("Emergency threshold must be below 100% at the configured decimals.")]
  ConfigThresholdScale,
}

/// Broad class of a rejection, for callers deciding whether to retry, wait or
/// escalate to the admin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RejectionKind {
  Authorization,
  PauseState,
  Threshold,
  Emergency,
  Precondition,
  Liquidity,
  Configuration,
}

impl PegError {
  pub const ALL: [PegError; 26] = [
    PegError::Unauthorized,
    PegError::UnpauseNotAdmin,
    PegError::AdminOnly,
    PegError::Paused,
    PegError::DegenerateFeedPrice,
    PegError::EmergencyThreshold,
    PegError::VolatilityThreshold,
    PegError::DivisionByZero,
    PegError::ArithmeticOverflow,
    PegError::MalformedReserves,
    PegError::DegeneratePrice,
    PegError::NegativePRatio,
    PegError::InsufficientLiquidity,
    PegError::InvalidSwapFee,
    PegError::ZeroAmount,
    PegError::InsufficientLiquidityMinted,
    PegError::InsufficientLiquidityBurned,
    PegError::InsufficientOutputAmount,
    PegError::SearchRange,
    PegError::InsufficientAllowance,
    PegError::InsufficientBalance,
    PegError::ConfigUnsetKey,
    PegError::ConfigRoleOverlap,
    PegError::ConfigThresholdOrder,
    PegError::ConfigDecimals,
    PegError::ConfigThresholdScale,
  ];

  #[must_use]
  pub fn kind(self) -> RejectionKind {
    use PegError::*;
    match self {
      Unauthorized | UnpauseNotAdmin | AdminOnly => {
        RejectionKind::Authorization
      }
      Paused => RejectionKind::PauseState,
      VolatilityThreshold => RejectionKind::Threshold,
      EmergencyThreshold | DegenerateFeedPrice => RejectionKind::Emergency,
      DivisionByZero | ArithmeticOverflow | MalformedReserves
      | DegeneratePrice | NegativePRatio | InvalidSwapFee | ZeroAmount
      | SearchRange => RejectionKind::Precondition,
      InsufficientLiquidity
      | InsufficientLiquidityMinted
      | InsufficientLiquidityBurned
      | InsufficientOutputAmount
      | InsufficientAllowance
      | InsufficientBalance => RejectionKind::Liquidity,
      ConfigUnsetKey | ConfigRoleOverlap | ConfigThresholdOrder
      | ConfigDecimals | ConfigThresholdScale => RejectionKind::Configuration,
    }
  }
}

impl RejectionKind {
  /// Classifies an error returned by this crate.
  /// Errors raised outside of [`PegError`] yield `None`.
  #[must_use]
  pub fn of(error: &Error) -> Option<RejectionKind> {
    match error {
      Error::AnchorError(anchor) => PegError::ALL
        .iter()
        .find(|code| u32::from(**code) == anchor.error_code_number)
        .map(|code| code.kind()),
      Error::ProgramError(_) => None,
    }
  }

  /// Threshold declines clear by themselves once the market moves.
  #[must_use]
  pub fn is_retryable(self) -> bool {
    self == RejectionKind::Threshold
  }
}
