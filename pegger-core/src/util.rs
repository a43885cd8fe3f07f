use rust_decimal::Decimal;

/// Renders a raw fixed-point amount for log lines, e.g. `2500000` at 6
/// decimals becomes `2.500000`.
///
/// Returns `None` when the value does not fit a `Decimal` mantissa.
#[must_use]
pub fn to_decimal(raw: u128, decimals: u8) -> Option<Decimal> {
  let mantissa = i128::try_from(raw).ok()?;
  Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals)).ok()
}

/// Log-friendly rendering that falls back to the raw integer.
#[must_use]
pub fn display_amount(raw: u128, decimals: u8) -> String {
  to_decimal(raw, decimals).map_or_else(|| raw.to_string(), |d| d.to_string())
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decimal_rendering() {
    assert_eq!(display_amount(2_500_000, 6), "2.500000");
    assert_eq!(display_amount(15, 0), "15");
  }

  #[test]
  fn decimal_out_of_range_falls_back() {
    assert_eq!(to_decimal(u128::MAX, 6), None);
    assert_eq!(display_amount(u128::MAX, 6), u128::MAX.to_string());
  }
}
