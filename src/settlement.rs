//! Settlement

use decimal_percentage::Percentage;
use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors raised while splitting a transaction amount.
#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    /// The host share could not be represented in minor units.
    #[error("settlement overflow")]
    Overflow,
}

/// Fraction of every transaction paid out to the car's owner.
pub fn host_share() -> Percentage {
    Percentage::from(Decimal::new(80, 2))
}

/// How a transaction amount is divided between the host and the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    /// Amount released to the host on payout.
    pub payout: u64,

    /// Amount retained by the platform.
    pub platform_fee: u64,
}

impl Split {
    /// Split `amount` (minor units) into host payout and platform fee.
    ///
    /// The payout is rounded half away from zero and the fee takes the remainder, so the two
    /// always add back up to `amount`.
    ///
    /// # Errors
    ///
    /// Returns [`SettlementError::Overflow`] if the payout does not fit in `u64`.
    pub fn of(amount: u64) -> Result<Self, SettlementError> {
        let payout = (host_share() * Decimal::from(amount))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .ok_or(SettlementError::Overflow)?;

        Ok(Self {
            payout,
            platform_fee: amount.saturating_sub(payout),
        })
    }
}
