//! Discount authenticity checks.
//!
//! A source's advertised percentage is never trusted: the discount is always
//! recomputed from the two prices and must fall inside the configured bounds.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AggregateError, ValidationFailure};

pub const DEFAULT_FLOOR_PCT: u8 = 10;
pub const DEFAULT_CEILING_PCT: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountValidator {
    floor_pct: u8,
    ceiling_pct: u8,
}

impl Default for DiscountValidator {
    fn default() -> Self {
        Self {
            floor_pct: DEFAULT_FLOOR_PCT,
            ceiling_pct: DEFAULT_CEILING_PCT,
        }
    }
}

impl DiscountValidator {
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidDiscountBounds`] if `floor_pct` is
    /// above `ceiling_pct` or `ceiling_pct` is above 100.
    pub fn new(floor_pct: u8, ceiling_pct: u8) -> Result<Self, AggregateError> {
        if floor_pct > ceiling_pct || ceiling_pct > 100 {
            return Err(AggregateError::InvalidDiscountBounds {
                floor: floor_pct,
                ceiling: ceiling_pct,
            });
        }
        Ok(Self {
            floor_pct,
            ceiling_pct,
        })
    }

    #[must_use]
    pub fn floor_pct(&self) -> u8 {
        self.floor_pct
    }

    #[must_use]
    pub fn ceiling_pct(&self) -> u8 {
        self.ceiling_pct
    }

    /// Check that `sale_price` is a genuine discount off `original_price` and
    /// return the recomputed percentage.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationFailure`] rule the prices break, in the
    /// order missing price, not a discount, too small, implausible.
    pub fn validate(
        &self,
        original_price: Option<Decimal>,
        sale_price: Option<Decimal>,
    ) -> Result<u8, ValidationFailure> {
        let (Some(original), Some(sale)) = (original_price, sale_price) else {
            return Err(ValidationFailure::MissingPrice);
        };
        if original <= Decimal::ZERO || sale <= Decimal::ZERO {
            return Err(ValidationFailure::MissingPrice);
        }
        if sale >= original {
            return Err(ValidationFailure::NotADiscount);
        }

        let discount = discount_percentage(original, sale);

        if discount < self.floor_pct {
            return Err(ValidationFailure::DiscountTooSmall {
                discount,
                floor: self.floor_pct,
            });
        }
        if discount > self.ceiling_pct {
            return Err(ValidationFailure::DiscountImplausible {
                discount,
                ceiling: self.ceiling_pct,
            });
        }

        Ok(discount)
    }
}

/// `round(100 * (original - sale) / original)`, half away from zero.
///
/// Callers guarantee `0 < sale < original`, which keeps the result in `1..=100`.
fn discount_percentage(original: Decimal, sale: Decimal) -> u8 {
    let pct = ((original - sale) * Decimal::ONE_HUNDRED / original)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    pct.to_u8().unwrap_or(100).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: i64) -> Option<Decimal> {
        Some(Decimal::new(value, 0))
    }

    #[test]
    fn thirty_percent_off_is_valid() {
        assert_eq!(DiscountValidator::default().validate(d(100), d(70)), Ok(30));
    }

    #[test]
    fn five_percent_off_is_too_small() {
        assert_eq!(
            DiscountValidator::default().validate(d(100), d(95)),
            Err(ValidationFailure::DiscountTooSmall {
                discount: 5,
                floor: 10
            })
        );
    }

    #[test]
    fn price_increase_is_not_a_discount() {
        assert_eq!(
            DiscountValidator::default().validate(d(100), d(150)),
            Err(ValidationFailure::NotADiscount)
        );
    }

    #[test]
    fn equal_prices_are_not_a_discount() {
        assert_eq!(
            DiscountValidator::default().validate(d(100), d(100)),
            Err(ValidationFailure::NotADiscount)
        );
    }

    #[test]
    fn ninety_five_percent_off_is_implausible() {
        assert_eq!(
            DiscountValidator::default().validate(d(100), d(5)),
            Err(ValidationFailure::DiscountImplausible {
                discount: 95,
                ceiling: 90
            })
        );
    }

    #[test]
    fn missing_or_non_positive_prices_fail_first() {
        let v = DiscountValidator::default();
        assert_eq!(v.validate(None, d(10)), Err(ValidationFailure::MissingPrice));
        assert_eq!(v.validate(d(100), None), Err(ValidationFailure::MissingPrice));
        assert_eq!(v.validate(d(0), d(10)), Err(ValidationFailure::MissingPrice));
        assert_eq!(v.validate(d(100), d(0)), Err(ValidationFailure::MissingPrice));
        assert_eq!(v.validate(d(-5), d(-10)), Err(ValidationFailure::MissingPrice));
    }

    #[test]
    fn bounds_are_inclusive() {
        let v = DiscountValidator::default();
        assert_eq!(v.validate(d(100), d(90)), Ok(10));
        assert_eq!(v.validate(d(100), d(10)), Ok(90));
    }

    #[test]
    fn half_percent_rounds_away_from_zero() {
        // 100 -> 87.5 is exactly 12.5% off.
        let v = DiscountValidator::default();
        assert_eq!(v.validate(d(100), Some(Decimal::new(875, 1))), Ok(13));
        // 59.99 -> 39.99 is 33.339...% off.
        assert_eq!(
            v.validate(Some(Decimal::new(5_999, 2)), Some(Decimal::new(3_999, 2))),
            Ok(33)
        );
    }

    #[test]
    fn custom_bounds_are_honoured() {
        let v = DiscountValidator::new(20, 60).expect("valid bounds");
        assert!(matches!(
            v.validate(d(100), d(85)),
            Err(ValidationFailure::DiscountTooSmall { floor: 20, .. })
        ));
        assert!(matches!(
            v.validate(d(100), d(30)),
            Err(ValidationFailure::DiscountImplausible { ceiling: 60, .. })
        ));
        assert_eq!(v.validate(d(100), d(50)), Ok(50));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        assert!(matches!(
            DiscountValidator::new(50, 40),
            Err(AggregateError::InvalidDiscountBounds { floor: 50, ceiling: 40 })
        ));
        assert!(DiscountValidator::new(10, 101).is_err());
    }

    #[test]
    fn every_accepted_discount_is_within_bounds() {
        let v = DiscountValidator::default();
        for original in [1_i64, 7, 19, 100, 999, 12_345] {
            for step in 1..40 {
                let sale = Decimal::new(original * 100 - step * original * 2, 2);
                let original = Decimal::new(original, 0);
                if let Ok(discount) = v.validate(Some(original), Some(sale)) {
                    assert!(sale < original);
                    assert!((10..=90).contains(&discount), "discount {discount}");
                }
            }
        }
    }
}
