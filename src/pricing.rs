//! Pricing

use jiff::civil::Date;
use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::{
    rules::{PriceRules, Season},
    stays::{Stay, StayError},
};

/// Currency every marketplace amount is denominated in.
pub const CURRENCY: &Currency = iso::USD;

/// Errors that can occur while pricing a stay.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The base rate was negative.
    #[error("base price must not be negative")]
    NegativeBasePrice,

    /// The base rate was not in the marketplace currency.
    #[error("base price is in {0}, expected {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// The stay could not be measured.
    #[error(transparent)]
    Stay(#[from] StayError),

    /// The total does not fit in minor units.
    #[error("price overflow")]
    Overflow,
}

/// How the weekend and seasonal multipliers take part in a quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PricingMode {
    /// `base × days + deposit`; multipliers are configured but not applied.
    #[default]
    Flat,

    /// Each charged day is multiplied by the weekend and/or seasonal multiplier.
    Weighted,
}

/// Price breakdown shown before a booking is confirmed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote<'a> {
    /// Chargeable days.
    pub days: u32,

    /// Rental charge before the deposit.
    pub rental: Money<'a, Currency>,

    /// Flat deposit from the pricing rules.
    pub deposit: Money<'a, Currency>,

    /// Amount charged for the booking.
    pub total: Money<'a, Currency>,
}

/// Pricing strategy applied to every quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricingPolicy {
    mode: PricingMode,
    season: Season,
}

impl PricingPolicy {
    /// Create a policy with the given mode and high season.
    pub fn new(mode: PricingMode, season: Season) -> Self {
        Self { mode, season }
    }

    /// Flat pricing, ignoring multipliers.
    pub fn flat() -> Self {
        Self::default()
    }

    /// Active pricing mode.
    pub fn mode(&self) -> PricingMode {
        self.mode
    }

    /// Price a stay.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] for a negative or foreign-currency base price, an
    /// unmeasurable stay, or an overflowing total.
    pub fn quote<'a>(
        &self,
        base_price: Money<'a, Currency>,
        stay: &Stay,
        rules: &PriceRules,
    ) -> Result<Quote<'a>, PricingError> {
        let currency = base_price.currency();

        if currency != CURRENCY {
            return Err(PricingError::CurrencyMismatch(
                currency.iso_alpha_code,
                CURRENCY.iso_alpha_code,
            ));
        }

        let base = base_price.to_minor_units();

        if base < 0 {
            return Err(PricingError::NegativeBasePrice);
        }

        let days = stay.days()?;

        let rental = match self.mode {
            PricingMode::Flat => base
                .checked_mul(i64::from(days))
                .ok_or(PricingError::Overflow)?,
            PricingMode::Weighted => self.weighted_rental(base, stay, rules)?,
        };

        let deposit = i64::try_from(rules.deposit_fee).map_err(|_source| PricingError::Overflow)?;
        let total = rental.checked_add(deposit).ok_or(PricingError::Overflow)?;

        Ok(Quote {
            days,
            rental: Money::from_minor(rental, currency),
            deposit: Money::from_minor(deposit, currency),
            total: Money::from_minor(total, currency),
        })
    }

    fn weighted_rental(
        &self,
        base: i64,
        stay: &Stay,
        rules: &PriceRules,
    ) -> Result<i64, PricingError> {
        let base = Decimal::from(base);

        let rental = stay
            .charged_dates()?
            .try_fold(Decimal::ZERO, |rental, day| {
                rules
                    .multiplier_for(day, &self.season)
                    .and_then(|multiplier| base.checked_mul(multiplier))
                    .and_then(|charge| rental.checked_add(charge))
            })
            .ok_or(PricingError::Overflow)?;

        rental
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(PricingError::Overflow)
    }
}

/// Compute the total charge for renting a car between two dates.
///
/// Either date being absent yields a zero total rather than an error, matching what the
/// booking panel shows before both dates are picked. The dates may be given in either
/// order. Multipliers are not applied; use [`PricingPolicy::quote`] for weighted pricing.
///
/// # Errors
///
/// Returns a [`PricingError`] for a negative or foreign-currency base price or an
/// overflowing total.
pub fn compute_total<'a>(
    base_price: Money<'a, Currency>,
    start: Option<Date>,
    end: Option<Date>,
    rules: &PriceRules,
) -> Result<Money<'a, Currency>, PricingError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(Money::from_minor(0, base_price.currency()));
    };

    let stay = Stay::spanning(start, end);

    PricingPolicy::flat()
        .quote(base_price, &stay, rules)
        .map(|quote| quote.total)
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    fn rules(deposit_fee: u64) -> PriceRules {
        PriceRules {
            deposit_fee,
            ..PriceRules::default()
        }
    }

    #[test]
    fn flat_total_is_rate_times_days_plus_deposit() -> TestResult {
        let total = compute_total(
            Money::from_minor(12_000, CURRENCY),
            Some(date(2024, 6, 1)),
            Some(date(2024, 6, 4)),
            &rules(50_000),
        )?;

        assert_eq!(total, Money::from_minor(86_000, CURRENCY));

        Ok(())
    }

    #[test]
    fn same_day_is_charged_as_one_day() -> TestResult {
        let day = Some(date(2024, 6, 1));

        let total = compute_total(Money::from_minor(12_000, CURRENCY), day, day, &rules(500))?;

        assert_eq!(total, Money::from_minor(12_500, CURRENCY));

        Ok(())
    }

    #[test]
    fn missing_date_yields_zero_sentinel() -> TestResult {
        let total = compute_total(
            Money::from_minor(12_000, CURRENCY),
            Some(date(2024, 6, 1)),
            None,
            &rules(50_000),
        )?;

        assert_eq!(total, Money::from_minor(0, CURRENCY));

        Ok(())
    }

    #[test]
    fn reversed_dates_use_absolute_distance() -> TestResult {
        let total = compute_total(
            Money::from_minor(100, CURRENCY),
            Some(date(2024, 6, 4)),
            Some(date(2024, 6, 1)),
            &rules(0),
        )?;

        assert_eq!(total, Money::from_minor(300, CURRENCY));

        Ok(())
    }

    #[test]
    fn negative_base_price_is_rejected() -> TestResult {
        let stay = Stay::parse("2024-06-01", "2024-06-02")?;

        let result = PricingPolicy::flat().quote(Money::from_minor(-1, CURRENCY), &stay, &rules(0));

        assert_eq!(result, Err(PricingError::NegativeBasePrice));

        Ok(())
    }

    #[test]
    fn foreign_currency_is_rejected() -> TestResult {
        let stay = Stay::parse("2024-06-01", "2024-06-02")?;

        let result = PricingPolicy::flat().quote(Money::from_minor(100, iso::GBP), &stay, &rules(0));

        assert_eq!(result, Err(PricingError::CurrencyMismatch("GBP", "USD")));

        Ok(())
    }

    #[test]
    fn flat_mode_ignores_multipliers() -> TestResult {
        // Saturday and Sunday in summer
        let stay = Stay::parse("2024-06-01", "2024-06-03")?;

        let quote = PricingPolicy::flat().quote(Money::from_minor(10_000, CURRENCY), &stay, &rules(0))?;

        assert_eq!(quote.rental, Money::from_minor(20_000, CURRENCY));

        Ok(())
    }

    #[test]
    fn weighted_mode_applies_weekend_and_season() -> TestResult {
        let policy = PricingPolicy::new(PricingMode::Weighted, Season::default());

        // Fri 31 May (off-season weekday), Sat 1 June (summer weekend), Sun 2 June (summer weekend)
        let stay = Stay::parse("2024-05-31", "2024-06-03")?;

        let quote = policy.quote(Money::from_minor(10_000, CURRENCY), &stay, &rules(500))?;

        // 10_000 + 13_200 + 13_200
        assert_eq!(quote.days, 3);
        assert_eq!(quote.rental, Money::from_minor(36_400, CURRENCY));
        assert_eq!(quote.deposit, Money::from_minor(500, CURRENCY));
        assert_eq!(quote.total, Money::from_minor(36_900, CURRENCY));

        Ok(())
    }

    #[test]
    fn weighted_mode_rounds_once_half_away_from_zero() -> TestResult {
        let policy = PricingPolicy::new(PricingMode::Weighted, Season::default());
        let rules = PriceRules {
            weekend_multiplier: Decimal::new(15, 1),
            seasonal_multiplier: Decimal::ONE,
            deposit_fee: 0,
        };

        // Saturday and Sunday off-season: 2 × 1.5 × 333 = 999
        let stay = Stay::parse("2024-03-02", "2024-03-04")?;
        let quote = policy.quote(Money::from_minor(333, CURRENCY), &stay, &rules)?;
        assert_eq!(quote.rental, Money::from_minor(999, CURRENCY));

        // Saturday only: 1.5 × 333 = 499.5 -> 500
        let stay = Stay::parse("2024-03-02", "2024-03-03")?;
        let quote = policy.quote(Money::from_minor(333, CURRENCY), &stay, &rules)?;
        assert_eq!(quote.rental, Money::from_minor(500, CURRENCY));

        Ok(())
    }

    #[test]
    fn overflowing_total_is_reported() -> TestResult {
        let stay = Stay::parse("2024-01-01", "2024-01-03")?;

        let result = PricingPolicy::flat().quote(Money::from_minor(i64::MAX, CURRENCY), &stay, &rules(0));

        assert_eq!(result, Err(PricingError::Overflow));

        Ok(())
    }

    #[test]
    fn overflowing_weighted_rental_is_reported() -> TestResult {
        let policy = PricingPolicy::new(PricingMode::Weighted, Season::default());
        let huge = Decimal::from(10_u64.pow(15));
        let rules = PriceRules::new(huge, huge, 0)?;

        // Summer Saturday: the combined multiplier alone overflows
        let stay = Stay::parse("2024-06-01", "2024-06-02")?;
        let result = policy.quote(Money::from_minor(12_000, CURRENCY), &stay, &rules);
        assert_eq!(result, Err(PricingError::Overflow));

        // Off-season Saturday: the multiplier fits but the rental does not fit minor units
        let stay = Stay::parse("2024-03-02", "2024-03-03")?;
        let result = policy.quote(Money::from_minor(12_000, CURRENCY), &stay, &rules);
        assert_eq!(result, Err(PricingError::Overflow));

        Ok(())
    }
}
