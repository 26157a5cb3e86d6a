//! Pricing Rules

use jiff::civil::{Date, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when validating pricing rules.
#[derive(Debug, Error, PartialEq)]
pub enum RulesError {
    /// A multiplier was zero or negative.
    #[error("{name} must be greater than zero, got {value}")]
    InvalidMultiplier {
        /// Which multiplier was rejected.
        name: &'static str,
        /// The rejected value.
        value: Decimal,
    },

    /// A season boundary is not a real month/day.
    #[error("invalid season boundary {month}-{day}")]
    InvalidSeason {
        /// Month of the rejected boundary.
        month: i8,
        /// Day of the rejected boundary.
        day: i8,
    },
}

/// Marketplace-wide pricing configuration.
///
/// Amounts are in minor units of the marketplace currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRules {
    /// Multiplier for days falling on a Saturday or Sunday.
    pub weekend_multiplier: Decimal,

    /// Multiplier for days falling inside the high season.
    pub seasonal_multiplier: Decimal,

    /// Flat deposit added to every booking.
    pub deposit_fee: u64,
}

impl PriceRules {
    /// Build validated rules.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidMultiplier`] when either multiplier is not positive.
    pub fn new(
        weekend_multiplier: Decimal,
        seasonal_multiplier: Decimal,
        deposit_fee: u64,
    ) -> Result<Self, RulesError> {
        let rules = Self {
            weekend_multiplier,
            seasonal_multiplier,
            deposit_fee,
        };

        rules.validate()?;

        Ok(rules)
    }

    /// Check the multipliers are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidMultiplier`] when either multiplier is not positive.
    pub fn validate(&self) -> Result<(), RulesError> {
        for (name, value) in [
            ("weekend multiplier", self.weekend_multiplier),
            ("seasonal multiplier", self.seasonal_multiplier),
        ] {
            if value <= Decimal::ZERO {
                return Err(RulesError::InvalidMultiplier { name, value });
            }
        }

        Ok(())
    }

    /// Combined multiplier for a single rented day, or `None` if it does not fit a
    /// [`Decimal`].
    pub fn multiplier_for(&self, day: Date, season: &Season) -> Option<Decimal> {
        let mut multiplier = Decimal::ONE;

        if matches!(day.weekday(), Weekday::Saturday | Weekday::Sunday) {
            multiplier = multiplier.checked_mul(self.weekend_multiplier)?;
        }

        if season.contains(day) {
            multiplier = multiplier.checked_mul(self.seasonal_multiplier)?;
        }

        Some(multiplier)
    }
}

impl Default for PriceRules {
    fn default() -> Self {
        Self {
            weekend_multiplier: Decimal::new(12, 1),
            seasonal_multiplier: Decimal::new(11, 1),
            deposit_fee: 50_000,
        }
    }
}

/// An annually recurring window of high-season days, inclusive on both ends.
///
/// A window whose start falls after its end wraps over the new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Season {
    start: (i8, i8),
    end: (i8, i8),
}

impl Season {
    /// Create a season from `(month, day)` boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::InvalidSeason`] when a boundary is not a valid day of a leap year.
    pub fn new(start: (i8, i8), end: (i8, i8)) -> Result<Self, RulesError> {
        for (month, day) in [start, end] {
            if Date::new(2024, month, day).is_err() {
                return Err(RulesError::InvalidSeason { month, day });
            }
        }

        Ok(Self { start, end })
    }

    /// Whether the given day falls in this season.
    pub fn contains(&self, day: Date) -> bool {
        let key = (day.month(), day.day());

        if self.start <= self.end {
            self.start <= key && key <= self.end
        } else {
            key >= self.start || key <= self.end
        }
    }
}

impl Default for Season {
    /// Northern-hemisphere summer: 1 June to 31 August.
    fn default() -> Self {
        Self {
            start: (6, 1),
            end: (8, 31),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn default_rules_match_marketplace_defaults() {
        let rules = PriceRules::default();

        assert_eq!(rules.weekend_multiplier, Decimal::new(12, 1));
        assert_eq!(rules.seasonal_multiplier, Decimal::new(11, 1));
        assert_eq!(rules.deposit_fee, 50_000);
    }

    #[test]
    fn non_positive_multiplier_is_rejected() {
        let result = PriceRules::new(Decimal::ZERO, Decimal::ONE, 0);

        assert!(matches!(
            result,
            Err(RulesError::InvalidMultiplier {
                name: "weekend multiplier",
                ..
            })
        ));
    }

    #[test]
    fn weekday_outside_season_has_unit_multiplier() {
        let rules = PriceRules::default();

        // Wednesday
        let multiplier = rules.multiplier_for(date(2024, 3, 6), &Season::default());

        assert_eq!(multiplier, Some(Decimal::ONE));
    }

    #[test]
    fn summer_saturday_stacks_both_multipliers() {
        let rules = PriceRules::default();

        let multiplier = rules.multiplier_for(date(2024, 6, 1), &Season::default());

        assert_eq!(multiplier, Some(Decimal::new(132, 2)));
    }

    #[test]
    fn oversized_multipliers_do_not_combine() -> TestResult {
        let huge = Decimal::from(10_u64.pow(15));
        let rules = PriceRules::new(huge, huge, 0)?;

        // Saturday in summer: 1e30 is past the largest Decimal
        assert_eq!(rules.multiplier_for(date(2024, 6, 1), &Season::default()), None);
        assert_eq!(
            rules.multiplier_for(date(2024, 3, 2), &Season::default()),
            Some(huge)
        );

        Ok(())
    }

    #[test]
    fn wrapping_season_covers_new_year() -> TestResult {
        let season = Season::new((12, 15), (1, 15))?;

        assert!(season.contains(date(2024, 12, 31)));
        assert!(season.contains(date(2025, 1, 2)));
        assert!(!season.contains(date(2025, 2, 1)));

        Ok(())
    }

    #[test]
    fn invalid_season_boundary_is_rejected() {
        assert_eq!(
            Season::new((2, 30), (3, 1)),
            Err(RulesError::InvalidSeason { month: 2, day: 30 })
        );
    }

    #[test]
    fn rules_serialize_with_camel_case_keys() -> TestResult {
        let rules: PriceRules = serde_norway::from_str(
            "weekendMultiplier: 1.5\nseasonalMultiplier: 1.0\ndepositFee: 2500\n",
        )?;

        assert_eq!(rules.weekend_multiplier, Decimal::new(15, 1));
        assert_eq!(rules.deposit_fee, 2500);

        Ok(())
    }
}
