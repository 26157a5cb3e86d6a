//! Stays

use jiff::{Span, civil::Date};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a stay interval.
#[derive(Debug, Error, PartialEq)]
pub enum StayError {
    /// A date string could not be parsed as a calendar date.
    #[error("invalid date {0:?}")]
    InvalidDate(String),

    /// The end date falls before the start date.
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart {
        /// Requested first day.
        start: Date,
        /// Requested last day.
        end: Date,
    },

    /// Calendar arithmetic left the supported date range.
    #[error("stay is outside the supported calendar range")]
    OutOfRange,
}

/// An inclusive calendar range a car is reserved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    start: Date,
    end: Date,
}

impl Stay {
    /// Create a stay from `start` to `end` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`StayError::EndBeforeStart`] when `end < start`.
    pub fn new(start: Date, end: Date) -> Result<Self, StayError> {
        if end < start {
            return Err(StayError::EndBeforeStart { start, end });
        }

        Ok(Self { start, end })
    }

    /// Create a stay spanning two dates given in either order.
    pub fn spanning(a: Date, b: Date) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Parse a stay from two ISO-8601 calendar dates (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns [`StayError::InvalidDate`] for unparseable input and
    /// [`StayError::EndBeforeStart`] for a reversed range.
    pub fn parse(start: &str, end: &str) -> Result<Self, StayError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// First day of the stay.
    pub fn start(&self) -> Date {
        self.start
    }

    /// Last day of the stay.
    pub fn end(&self) -> Date {
        self.end
    }

    /// Number of chargeable days.
    ///
    /// This is the whole-day distance between the two dates, never less than one, so a
    /// same-day rental is still charged for a day.
    ///
    /// # Errors
    ///
    /// Returns [`StayError::OutOfRange`] if the span cannot be computed.
    pub fn days(&self) -> Result<u32, StayError> {
        let span = self
            .end
            .since(self.start)
            .map_err(|_source| StayError::OutOfRange)?;

        let days = u32::try_from(span.get_days()).map_err(|_source| StayError::OutOfRange)?;

        Ok(days.max(1))
    }

    /// The chargeable days, one date per unit of [`Stay::days`], starting on the first day.
    ///
    /// # Errors
    ///
    /// Returns [`StayError::OutOfRange`] if the span cannot be computed.
    pub fn charged_dates(&self) -> Result<impl Iterator<Item = Date>, StayError> {
        let days = self.days()?;

        Ok(self
            .start
            .series(Span::new().days(1))
            .take(days as usize))
    }
}

/// Parse a single `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`StayError::InvalidDate`] when the input is not a valid date.
pub fn parse_date(raw: &str) -> Result<Date, StayError> {
    raw.trim()
        .parse::<Date>()
        .map_err(|_source| StayError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn days_counts_whole_days_between_dates() -> TestResult {
        let stay = Stay::parse("2024-06-01", "2024-06-04")?;

        assert_eq!(stay.days()?, 3);

        Ok(())
    }

    #[test]
    fn same_day_stay_is_charged_one_day() -> TestResult {
        let stay = Stay::parse("2024-06-01", "2024-06-01")?;

        assert_eq!(stay.days()?, 1);

        Ok(())
    }

    #[test]
    fn days_crosses_month_and_leap_day() -> TestResult {
        let stay = Stay::new(date(2024, 2, 27), date(2024, 3, 2))?;

        assert_eq!(stay.days()?, 4);

        Ok(())
    }

    #[test]
    fn reversed_range_is_rejected() {
        let result = Stay::parse("2024-06-04", "2024-06-01");

        assert_eq!(
            result,
            Err(StayError::EndBeforeStart {
                start: date(2024, 6, 4),
                end: date(2024, 6, 1),
            })
        );
    }

    #[test]
    fn spanning_orders_the_dates() {
        let stay = Stay::spanning(date(2024, 6, 4), date(2024, 6, 1));

        assert_eq!(stay.start(), date(2024, 6, 1));
        assert_eq!(stay.end(), date(2024, 6, 4));
    }

    #[test]
    fn invalid_date_is_rejected() {
        assert_eq!(
            parse_date("2024-02-30"),
            Err(StayError::InvalidDate("2024-02-30".to_string()))
        );
        assert!(parse_date("").is_err());
    }

    #[test]
    fn charged_dates_start_on_first_day() -> TestResult {
        let stay = Stay::parse("2024-06-07", "2024-06-09")?;

        let dates: Vec<Date> = stay.charged_dates()?.collect();

        assert_eq!(dates, vec![date(2024, 6, 7), date(2024, 6, 8)]);

        Ok(())
    }

    #[test]
    fn same_day_stay_charges_the_start_date() -> TestResult {
        let stay = Stay::parse("2024-06-08", "2024-06-08")?;

        let dates: Vec<Date> = stay.charged_dates()?.collect();

        assert_eq!(dates, vec![date(2024, 6, 8)]);

        Ok(())
    }
}
