//! Quantities and monetary rounding.

use rust_decimal::{Decimal, RoundingStrategy};

/// Stock quantity in whole units. Signed so that a permitted negative position
/// can be represented.
pub type Quantity = i64;

/// Decimal places of the tenant's base currency unless configured otherwise.
pub const DEFAULT_MONEY_SCALE: u32 = 2;

/// Round a monetary amount to `scale` decimal places, half away from zero.
///
/// Average costs are kept unrounded; every amount that reaches the general
/// ledger or a cash register goes through here first.
pub fn round_money(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// `quantity × unit_cost` as a decimal (no rounding).
pub fn extend(quantity: Quantity, unit_cost: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(dec!(2.345), 2), dec!(2.35));
        assert_eq!(round_money(dec!(-2.345), 2), dec!(-2.35));
        assert_eq!(round_money(dec!(2.344), 2), dec!(2.34));
    }

    #[test]
    fn zero_scale_rounds_to_units() {
        assert_eq!(round_money(dec!(99.5), 0), dec!(100));
    }

    #[test]
    fn extend_keeps_full_precision() {
        assert_eq!(extend(3, dec!(33.3333)), dec!(99.9999));
    }
}
