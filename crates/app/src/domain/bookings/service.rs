//! Bookings service.

use std::sync::Arc;

use async_trait::async_trait;
use driveshare::{
    pricing::{CURRENCY, PricingError, PricingPolicy, Quote},
    stays::Stay,
};
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashSet;
use rusty_money::Money;
use tracing::{error, info, instrument};

use crate::{
    domain::{
        access::{Actor, Capability, Visibility},
        bookings::{
            data::{BookingQuery, BookingRequest, ConfirmedBooking},
            records::{BookingRecord, BookingStatus, BookingUuid},
        },
        cars::{
            records::{CarRecord, CarStatus},
            service::is_visible_to,
        },
        errors::{Entity, MarketplaceError, StorageResultExt, describe},
        payouts::records::{PaymentStatus, PayoutStatus, TransactionRecord, TransactionUuid},
    },
    storage::{BookingFilter, Storage, StorageError},
};

#[derive(Clone)]
pub struct StorageBookingsService {
    storage: Arc<dyn Storage>,
    policy: PricingPolicy,
}

impl StorageBookingsService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, policy: PricingPolicy) -> Self {
        Self { storage, policy }
    }

    async fn price(
        &self,
        car: &CarRecord,
        request: &BookingRequest,
    ) -> Result<Quote<'static>, MarketplaceError> {
        let stay = Stay::new(request.start, request.end)
            .map_err(|error| MarketplaceError::Validation(error.to_string()))?;

        let base_price = i64::try_from(car.base_price)
            .map_err(|_source| MarketplaceError::Validation("base price overflow".to_string()))?;

        let rules = self.storage.get_rules().await?;

        self.policy
            .quote(Money::from_minor(base_price, CURRENCY), &stay, &rules)
            .map_err(|error: PricingError| MarketplaceError::Validation(error.to_string()))
    }
}

/// Bookings matching `filter` that the caller may read, oldest first.
pub(crate) async fn visible_bookings(
    storage: &dyn Storage,
    actor: Actor,
    filter: BookingFilter,
) -> Result<Vec<BookingRecord>, MarketplaceError> {
    let user = match actor.visibility()? {
        Visibility::Everything => return Ok(storage.list_bookings(filter).await?),
        Visibility::PartyTo(user) => user,
    };

    let mut bookings = storage
        .list_bookings(BookingFilter {
            renter: Some(user),
            ..filter
        })
        .await?;

    let mut seen: FxHashSet<BookingUuid> = bookings.iter().map(|booking| booking.uuid).collect();

    let owned = storage
        .list_bookings(BookingFilter {
            car_owner: Some(user),
            ..filter
        })
        .await?;

    bookings.extend(owned.into_iter().filter(|booking| seen.insert(booking.uuid)));
    bookings.sort_by_key(|booking| (booking.created_at, booking.uuid));

    Ok(bookings)
}

/// Whether the caller is a party to `booking` or an admin.
pub(crate) async fn can_read_booking(
    storage: &dyn Storage,
    actor: Actor,
    booking: &BookingRecord,
) -> Result<bool, MarketplaceError> {
    match actor.visibility()? {
        Visibility::Everything => Ok(true),
        Visibility::PartyTo(user) if booking.renter_uuid == user => Ok(true),
        Visibility::PartyTo(user) => {
            let car = storage
                .get_car(booking.car_uuid)
                .await
                .or_not_found(Entity::Car)?;

            Ok(car.owner_uuid == user)
        }
    }
}

#[async_trait]
impl BookingsService for StorageBookingsService {
    async fn quote(
        &self,
        actor: Actor,
        request: BookingRequest,
    ) -> Result<Quote<'static>, MarketplaceError> {
        let car = self
            .storage
            .get_car(request.car)
            .await
            .or_not_found(Entity::Car)?;

        if !is_visible_to(&car, actor) {
            return Err(MarketplaceError::NotFound(Entity::Car));
        }

        self.price(&car, &request).await
    }

    #[instrument(skip(self, request), fields(car = %request.car))]
    async fn create_booking(
        &self,
        actor: Actor,
        request: BookingRequest,
    ) -> Result<ConfirmedBooking, MarketplaceError> {
        let renter = actor.require(Capability::Authenticated)?;

        if request.end < request.start {
            return Err(MarketplaceError::Validation(format!(
                "end date {} is before start date {}",
                request.end, request.start
            )));
        }

        let car = self
            .storage
            .get_car(request.car)
            .await
            .or_not_found(Entity::Car)?;

        if car.status != CarStatus::Approved {
            return Err(MarketplaceError::InvalidState(format!(
                "car is {} and cannot be booked",
                car.status
            )));
        }

        let quote = self.price(&car, &request).await?;

        let total_price = u64::try_from(quote.total.to_minor_units())
            .map_err(|_source| MarketplaceError::Validation("total price overflow".to_string()))?;

        let booking = BookingRecord {
            uuid: BookingUuid::new(),
            renter_uuid: renter,
            car_uuid: car.uuid,
            start_date: request.start,
            end_date: request.end,
            total_price,
            status: BookingStatus::Paid,
            created_at: Timestamp::now(),
        };

        let transaction = TransactionRecord {
            uuid: TransactionUuid::new(),
            booking_uuid: booking.uuid,
            amount: total_price,
            payment_status: PaymentStatus::Success,
            payout_status: PayoutStatus::Pending,
        };

        match self
            .storage
            .create_booking(booking.clone(), transaction.clone())
            .await
        {
            Ok(()) => {}
            Err(error @ (StorageError::NotFound | StorageError::InvalidReference)) => {
                return Err(MarketplaceError::storage(Entity::Car, error));
            }
            Err(error @ StorageError::AlreadyExists) => {
                return Err(MarketplaceError::storage(Entity::Booking, error));
            }
            Err(failure) => {
                let message = describe(&failure);

                error!(%message, "booking was not stored");

                return Err(MarketplaceError::BookingFailed { message });
            }
        }

        info!(
            booking = %booking.uuid,
            renter = %renter,
            days = quote.days,
            total = total_price,
            "booking confirmed"
        );

        Ok(ConfirmedBooking {
            booking,
            transaction,
        })
    }

    async fn list_bookings(
        &self,
        actor: Actor,
        query: BookingQuery,
    ) -> Result<Vec<BookingRecord>, MarketplaceError> {
        visible_bookings(
            self.storage.as_ref(),
            actor,
            BookingFilter {
                car: query.car,
                ..BookingFilter::default()
            },
        )
        .await
    }

    async fn get_booking(
        &self,
        actor: Actor,
        booking: BookingUuid,
    ) -> Result<BookingRecord, MarketplaceError> {
        let record = self
            .storage
            .get_booking(booking)
            .await
            .or_not_found(Entity::Booking)?;

        if !can_read_booking(self.storage.as_ref(), actor, &record).await? {
            return Err(MarketplaceError::NotFound(Entity::Booking));
        }

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait BookingsService: Send + Sync {
    /// Price a stay on a car without booking it.
    async fn quote(
        &self,
        actor: Actor,
        request: BookingRequest,
    ) -> Result<Quote<'static>, MarketplaceError>;

    /// Book an approved car for the calling user and record its payment. The booking and
    /// the transaction are stored together or not at all.
    async fn create_booking(
        &self,
        actor: Actor,
        request: BookingRequest,
    ) -> Result<ConfirmedBooking, MarketplaceError>;

    /// Retrieve the bookings the caller may see: admins see all, everyone else the
    /// bookings they made or that were made on their cars.
    async fn list_bookings(
        &self,
        actor: Actor,
        query: BookingQuery,
    ) -> Result<Vec<BookingRecord>, MarketplaceError>;

    /// Retrieve a single booking.
    async fn get_booking(
        &self,
        actor: Actor,
        booking: BookingUuid,
    ) -> Result<BookingRecord, MarketplaceError>;
}
