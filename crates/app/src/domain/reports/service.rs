//! Reports service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;

use crate::{
    domain::{
        access::{Actor, Capability},
        cars::records::CarStatus,
        errors::MarketplaceError,
        payouts::{records::PayoutStatus, service::split},
        reports::data::{OwnerEarnings, PlatformStats},
    },
    storage::{BookingFilter, CarFilter, Storage, TransactionFilter},
};

#[derive(Clone)]
pub struct StorageReportsService {
    storage: Arc<dyn Storage>,
}

impl StorageReportsService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ReportsService for StorageReportsService {
    async fn owner_earnings(&self, actor: Actor) -> Result<OwnerEarnings, MarketplaceError> {
        let owner = actor.require(Capability::ListCars)?;

        let bookings = self
            .storage
            .list_bookings(BookingFilter {
                car_owner: Some(owner),
                ..BookingFilter::default()
            })
            .await?;

        let transactions = self
            .storage
            .list_transactions(TransactionFilter {
                car_owner: Some(owner),
                ..TransactionFilter::default()
            })
            .await?;

        let mut earnings = OwnerEarnings {
            owner,
            bookings: bookings.len(),
            released: 0,
            pending: 0,
        };

        for transaction in &transactions {
            let payout = split(transaction)?.payout;

            let bucket = match transaction.payout_status {
                PayoutStatus::Paid => &mut earnings.released,
                PayoutStatus::Pending => &mut earnings.pending,
            };

            *bucket = bucket.saturating_add(payout);
        }

        Ok(earnings)
    }

    async fn platform_stats(&self, actor: Actor) -> Result<PlatformStats, MarketplaceError> {
        actor.require(Capability::Administer)?;

        let transactions = self
            .storage
            .list_transactions(TransactionFilter::default())
            .await?;
        let bookings = self.storage.list_bookings(BookingFilter::default()).await?;
        let pending = self
            .storage
            .list_cars(CarFilter {
                status: Some(CarStatus::Pending),
                owner: None,
            })
            .await?;

        let mut total_revenue = 0_u64;
        let mut platform_fees = 0_u64;

        for transaction in &transactions {
            total_revenue = total_revenue.saturating_add(transaction.amount);
            platform_fees = platform_fees.saturating_add(split(transaction)?.platform_fee);
        }

        let renters: FxHashSet<_> = bookings.iter().map(|booking| booking.renter_uuid).collect();

        Ok(PlatformStats {
            total_revenue,
            platform_fees,
            pending_approvals: pending.len(),
            active_renters: renters.len(),
            bookings: bookings.len(),
        })
    }
}

#[automock]
#[async_trait]
pub trait ReportsService: Send + Sync {
    /// Earnings of the calling owner, released and pending.
    async fn owner_earnings(&self, actor: Actor) -> Result<OwnerEarnings, MarketplaceError>;

    /// Marketplace totals (admin only).
    async fn platform_stats(&self, actor: Actor) -> Result<PlatformStats, MarketplaceError>;
}
