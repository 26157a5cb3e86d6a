//! Payouts service.

use std::sync::Arc;

use async_trait::async_trait;
use driveshare::settlement::Split;
use mockall::automock;
use rustc_hash::FxHashSet;
use tracing::{info, instrument, warn};

use crate::{
    domain::{
        access::{Actor, Capability, Visibility},
        errors::{Entity, MarketplaceError, StorageResultExt},
        payouts::{
            data::{PayoutRelease, PendingPayout, TransactionQuery},
            records::{PaymentStatus, PayoutStatus, TransactionRecord, TransactionUuid},
        },
    },
    storage::{Storage, StorageError, TransactionFilter},
};

#[derive(Clone)]
pub struct StoragePayoutsService {
    storage: Arc<dyn Storage>,
}

impl StoragePayoutsService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    async fn pending_payout(
        &self,
        transaction: TransactionRecord,
    ) -> Result<PendingPayout, MarketplaceError> {
        let booking = self
            .storage
            .get_booking(transaction.booking_uuid)
            .await
            .or_not_found(Entity::Booking)?;

        let car = self
            .storage
            .get_car(booking.car_uuid)
            .await
            .or_not_found(Entity::Car)?;

        let owner = match self.storage.get_user(car.owner_uuid).await {
            Ok(owner) => Some(owner),
            Err(StorageError::NotFound) => None,
            Err(error) => return Err(error.into()),
        };

        let split = split(&transaction)?;

        Ok(PendingPayout {
            transaction,
            booking,
            car,
            owner,
            split,
        })
    }
}

pub(crate) fn split(transaction: &TransactionRecord) -> Result<Split, MarketplaceError> {
    Split::of(transaction.amount)
        .map_err(|error| MarketplaceError::Validation(format!("{error} in {}", transaction.uuid)))
}

/// Transactions matching `filter` that the caller may read.
pub(crate) async fn visible_transactions(
    storage: &dyn Storage,
    actor: Actor,
    filter: TransactionFilter,
) -> Result<Vec<TransactionRecord>, MarketplaceError> {
    let user = match actor.visibility()? {
        Visibility::Everything => return Ok(storage.list_transactions(filter).await?),
        Visibility::PartyTo(user) => user,
    };

    let mut transactions = storage
        .list_transactions(TransactionFilter {
            renter: Some(user),
            ..filter
        })
        .await?;

    let mut seen: FxHashSet<TransactionUuid> = transactions.iter().map(|tx| tx.uuid).collect();

    let owned = storage
        .list_transactions(TransactionFilter {
            car_owner: Some(user),
            ..filter
        })
        .await?;

    transactions.extend(owned.into_iter().filter(|tx| seen.insert(tx.uuid)));

    Ok(transactions)
}

#[async_trait]
impl PayoutsService for StoragePayoutsService {
    async fn list_transactions(
        &self,
        actor: Actor,
        query: TransactionQuery,
    ) -> Result<Vec<TransactionRecord>, MarketplaceError> {
        visible_transactions(
            self.storage.as_ref(),
            actor,
            TransactionFilter {
                booking: query.booking,
                payout_status: query.payout_status,
                ..TransactionFilter::default()
            },
        )
        .await
    }

    async fn pending_payouts(&self, actor: Actor) -> Result<Vec<PendingPayout>, MarketplaceError> {
        actor.require(Capability::Administer)?;

        let transactions = self
            .storage
            .list_transactions(TransactionFilter {
                payout_status: Some(PayoutStatus::Pending),
                ..TransactionFilter::default()
            })
            .await?;

        let mut payouts = Vec::with_capacity(transactions.len());

        for transaction in transactions {
            let uuid = transaction.uuid;

            match self.pending_payout(transaction).await {
                Ok(payout) => payouts.push(payout),
                Err(MarketplaceError::NotFound(missing)) => {
                    warn!(
                        transaction = %uuid,
                        %missing,
                        "skipping payout with a dangling reference"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        Ok(payouts)
    }

    #[instrument(skip(self))]
    async fn release_payout(
        &self,
        actor: Actor,
        transaction: TransactionUuid,
    ) -> Result<PayoutRelease, MarketplaceError> {
        actor.require(Capability::Administer)?;

        let record = self
            .storage
            .get_transaction(transaction)
            .await
            .or_not_found(Entity::Transaction)?;

        if record.payment_status != PaymentStatus::Success {
            return Err(MarketplaceError::InvalidState(format!(
                "payment is {}; nothing to pay out",
                record.payment_status
            )));
        }

        let released = self
            .storage
            .mark_payout_paid(transaction)
            .await
            .or_not_found(Entity::Transaction)?;

        let record = self
            .storage
            .get_transaction(transaction)
            .await
            .or_not_found(Entity::Transaction)?;

        if !released {
            info!("payout was already released");

            return Ok(PayoutRelease::AlreadyPaid(record));
        }

        info!(payout = split(&record)?.payout, "payout released");

        Ok(PayoutRelease::Released(record))
    }
}

#[automock]
#[async_trait]
pub trait PayoutsService: Send + Sync {
    /// Retrieve the transactions the caller may see, following their bookings.
    async fn list_transactions(
        &self,
        actor: Actor,
        query: TransactionQuery,
    ) -> Result<Vec<TransactionRecord>, MarketplaceError>;

    /// Payouts awaiting release, with their booking, car and owner (admin only).
    async fn pending_payouts(&self, actor: Actor) -> Result<Vec<PendingPayout>, MarketplaceError>;

    /// Release the host's share of a transaction (admin only).
    ///
    /// Releasing an already paid transaction changes nothing and reports
    /// [`PayoutRelease::AlreadyPaid`].
    async fn release_payout(
        &self,
        actor: Actor,
        transaction: TransactionUuid,
    ) -> Result<PayoutRelease, MarketplaceError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use crate::{
        domain::{
            bookings::{BookingsService, data::BookingRequest, records::BookingUuid},
            errors::ErrorKind,
            users::records::Role,
        },
        storage::LocalStorage,
        test::TestContext,
    };

    use super::*;

    async fn book(ctx: &TestContext) -> Result<TransactionRecord, MarketplaceError> {
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

        Ok(confirmed.transaction)
    }

    #[tokio::test]
    async fn release_is_idempotent() -> TestResult {
        let ctx = TestContext::seeded()?;
        let transaction = book(&ctx).await?;

        let first = ctx.payouts.release_payout(ctx.admin, transaction.uuid).await?;
        let second = ctx.payouts.release_payout(ctx.admin, transaction.uuid).await?;

        assert!(matches!(first, PayoutRelease::Released(_)));
        assert!(matches!(second, PayoutRelease::AlreadyPaid(_)));
        assert_eq!(second.transaction().payout_status, PayoutStatus::Paid);

        let snapshot = ctx.storage.snapshot().await;
        assert_eq!(snapshot.transactions.len(), 1);
        assert_eq!(
            snapshot.transactions.first().map(|tx| tx.payout_status),
            Some(PayoutStatus::Paid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn only_admins_release_payouts() -> TestResult {
        let ctx = TestContext::seeded()?;
        let transaction = book(&ctx).await?;

        for actor in [ctx.owner, ctx.renter, Actor::Anonymous] {
            let result = ctx.payouts.release_payout(actor, transaction.uuid).await;

            assert_eq!(
                result.err().map(|error| error.kind()),
                Some(ErrorKind::Unauthorized)
            );
        }

        assert_eq!(
            ctx.payouts
                .release_payout(ctx.admin, TransactionUuid::new())
                .await
                .err()
                .map(|error| error.kind()),
            Some(ErrorKind::NotFound)
        );

        Ok(())
    }

    #[tokio::test]
    async fn pending_payouts_join_booking_car_and_owner() -> TestResult {
        let ctx = TestContext::seeded()?;
        let transaction = book(&ctx).await?;

        let pending = ctx.payouts.pending_payouts(ctx.admin).await?;
        let payout = pending.first().ok_or("expected one pending payout")?;

        assert_eq!(pending.len(), 1);
        assert_eq!(payout.transaction, transaction);
        assert_eq!(payout.car.uuid, ctx.tesla());
        assert_eq!(payout.owner.as_ref().map(|owner| owner.role), Some(Role::Owner));
        assert_eq!(payout.split.payout, 68_800);
        assert_eq!(payout.split.platform_fee, 17_200);

        ctx.payouts.release_payout(ctx.admin, transaction.uuid).await?;

        assert!(ctx.payouts.pending_payouts(ctx.admin).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn dangling_transaction_does_not_hide_the_queue() -> TestResult {
        let ctx = TestContext::seeded()?;
        let transaction = book(&ctx).await?;

        let mut snapshot = ctx.storage.snapshot().await;
        snapshot.transactions.push(TransactionRecord {
            uuid: TransactionUuid::new(),
            booking_uuid: BookingUuid::new(),
            ..transaction.clone()
        });
        let payouts = StoragePayoutsService::new(Arc::new(LocalStorage::in_memory(snapshot)));

        let pending = payouts.pending_payouts(ctx.admin).await?;

        assert_eq!(pending.len(), 1);
        assert_eq!(
            pending.first().map(|payout| payout.transaction.uuid),
            Some(transaction.uuid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn transactions_follow_booking_visibility() -> TestResult {
        let ctx = TestContext::seeded()?;
        book(&ctx).await?;
        let stranger = ctx.register(Role::Renter, "stranger@example.com").await?;
        let query = TransactionQuery::default();

        assert_eq!(ctx.payouts.list_transactions(ctx.renter, query).await?.len(), 1);
        assert_eq!(ctx.payouts.list_transactions(ctx.owner, query).await?.len(), 1);
        assert_eq!(ctx.payouts.list_transactions(ctx.admin, query).await?.len(), 1);
        assert!(ctx.payouts.list_transactions(stranger, query).await?.is_empty());

        Ok(())
    }
}
