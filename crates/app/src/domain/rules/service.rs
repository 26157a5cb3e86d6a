//! Pricing rules service.

use std::sync::Arc;

use async_trait::async_trait;
use driveshare::rules::PriceRules;
use mockall::automock;
use tracing::{info, instrument};

use crate::{
    domain::{
        access::{Actor, Capability},
        errors::MarketplaceError,
    },
    storage::Storage,
};

#[derive(Clone)]
pub struct StorageRulesService {
    storage: Arc<dyn Storage>,
}

impl StorageRulesService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl RulesService for StorageRulesService {
    async fn get_rules(&self) -> Result<PriceRules, MarketplaceError> {
        Ok(self.storage.get_rules().await?)
    }

    #[instrument(skip(self))]
    async fn update_rules(
        &self,
        actor: Actor,
        rules: PriceRules,
    ) -> Result<PriceRules, MarketplaceError> {
        actor.require(Capability::Administer)?;

        rules
            .validate()
            .map_err(|error| MarketplaceError::Validation(error.to_string()))?;

        let stored = self.storage.put_rules(rules).await?;

        info!("pricing rules replaced");

        Ok(stored)
    }
}

#[automock]
#[async_trait]
pub trait RulesService: Send + Sync {
    /// Current pricing rules.
    async fn get_rules(&self) -> Result<PriceRules, MarketplaceError>;

    /// Replace the pricing rules wholesale (admin only).
    async fn update_rules(
        &self,
        actor: Actor,
        rules: PriceRules,
    ) -> Result<PriceRules, MarketplaceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        domain::{
            bookings::{BookingsService, data::BookingRequest},
            errors::ErrorKind,
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn admin_replaces_rules_wholesale() -> TestResult {
        let ctx = TestContext::seeded()?;
        let rules = PriceRules::new(Decimal::new(15, 1), Decimal::ONE, 0)?;

        let stored = ctx.rules.update_rules(ctx.admin, rules).await?;

        assert_eq!(stored, rules);
        assert_eq!(ctx.rules.get_rules().await?, rules);

        Ok(())
    }

    #[tokio::test]
    async fn non_admins_cannot_change_rules() -> TestResult {
        let ctx = TestContext::seeded()?;

        let result = ctx
            .rules
            .update_rules(ctx.owner, PriceRules::default())
            .await;

        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(ErrorKind::Unauthorized)
        );
        assert_eq!(ctx.rules.get_rules().await?, PriceRules::default());

        Ok(())
    }

    #[tokio::test]
    async fn non_positive_multiplier_is_rejected() -> TestResult {
        let ctx = TestContext::seeded()?;
        let rules = PriceRules {
            weekend_multiplier: Decimal::ZERO,
            ..PriceRules::default()
        };

        let result = ctx.rules.update_rules(ctx.admin, rules).await;

        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(ErrorKind::Validation)
        );

        Ok(())
    }

    #[tokio::test]
    async fn new_deposit_applies_to_later_bookings() -> TestResult {
        let ctx = TestContext::seeded()?;
        let rules = PriceRules {
            deposit_fee: 10_000,
            ..PriceRules::default()
        };
        ctx.rules.update_rules(ctx.admin, rules).await?;

        let confirmed = ctx
            .bookings
            .create_booking(
                ctx.renter,
                BookingRequest {
                    car: ctx.tesla(),
                    start: date(2024, 6, 1),
                    end: date(2024, 6, 4),
                },
            )
            .await?;

        assert_eq!(confirmed.booking.total_price, 36_000 + 10_000);

        Ok(())
    }
}
