//! Storage backends.
//!
//! [`Storage`] is the row store the marketplace services sit on: equality-filtered reads,
//! single-row inserts, and compare-and-set updates for the two state machines (car approval
//! and payout release). [`LocalStorage`] keeps everything in memory and snapshots it to a
//! JSON file; [`PgStorage`] talks to PostgreSQL.

use async_trait::async_trait;
use driveshare::rules::PriceRules;
use mockall::automock;
use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

use crate::domain::{
    bookings::records::{BookingRecord, BookingUuid},
    cars::records::{CarRecord, CarStatus, CarUuid},
    payouts::records::{PayoutStatus, TransactionRecord, TransactionUuid},
    users::records::{UserRecord, UserUuid},
};

pub mod local;
pub mod postgres;

pub use local::{LocalStorage, Snapshot};
pub use postgres::PgStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("related record not found")]
    InvalidReference,

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),

    #[error("snapshot io error")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error")]
    Snapshot(#[from] serde_json::Error),

    #[error("seed fixture error")]
    Fixture(#[from] serde_norway::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(_) | None => Self::Sql(error),
        }
    }
}

/// Equality filters over cars. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarFilter {
    pub status: Option<CarStatus>,
    pub owner: Option<UserUuid>,
}

/// Filters over bookings. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BookingFilter {
    pub renter: Option<UserUuid>,
    pub car: Option<CarUuid>,

    /// Bookings on cars listed by this owner.
    pub car_owner: Option<UserUuid>,
}

/// Filters over transactions. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionFilter {
    pub booking: Option<BookingUuid>,
    pub payout_status: Option<PayoutStatus>,

    /// Transactions for bookings made by this renter.
    pub renter: Option<UserUuid>,

    /// Transactions for bookings on cars listed by this owner.
    pub car_owner: Option<UserUuid>,
}

#[automock]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Retrieve a single user.
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, StorageError>;

    /// Find a user by email, ignoring case.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Retrieve all users.
    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError>;

    /// Insert a user.
    async fn create_user(&self, user: UserRecord) -> Result<UserRecord, StorageError>;

    /// Retrieve cars matching the filter.
    async fn list_cars(&self, filter: CarFilter) -> Result<Vec<CarRecord>, StorageError>;

    /// Retrieve a single car.
    async fn get_car(&self, car: CarUuid) -> Result<CarRecord, StorageError>;

    /// Insert a car exactly as given.
    async fn create_car(&self, car: CarRecord) -> Result<CarRecord, StorageError>;

    /// Set a car's status to `to` if it is currently `from`.
    ///
    /// Returns `false` when the car exists but is in another state.
    async fn transition_car_status(
        &self,
        car: CarUuid,
        from: CarStatus,
        to: CarStatus,
    ) -> Result<bool, StorageError>;

    /// Retrieve bookings matching the filter.
    async fn list_bookings(&self, filter: BookingFilter)
    -> Result<Vec<BookingRecord>, StorageError>;

    /// Retrieve a single booking.
    async fn get_booking(&self, booking: BookingUuid) -> Result<BookingRecord, StorageError>;

    /// Insert a booking and its payment transaction; either both are stored or neither is.
    async fn create_booking(
        &self,
        booking: BookingRecord,
        transaction: TransactionRecord,
    ) -> Result<(), StorageError>;

    /// Retrieve transactions matching the filter.
    async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionRecord>, StorageError>;

    /// Retrieve a single transaction.
    async fn get_transaction(
        &self,
        transaction: TransactionUuid,
    ) -> Result<TransactionRecord, StorageError>;

    /// Mark a pending payout as paid.
    ///
    /// Returns `false` when the payout had already been paid.
    async fn mark_payout_paid(&self, transaction: TransactionUuid) -> Result<bool, StorageError>;

    /// Retrieve the pricing rules.
    async fn get_rules(&self) -> Result<PriceRules, StorageError>;

    /// Replace the pricing rules.
    async fn put_rules(&self, rules: PriceRules) -> Result<PriceRules, StorageError>;
}

/// Copy every record of `snapshot` into `storage`, which is expected to be empty.
///
/// # Errors
///
/// Returns an error if a record cannot be written, or [`StorageError::Corrupt`] when a
/// booking has no matching transaction.
pub async fn import(storage: &dyn Storage, snapshot: &Snapshot) -> Result<(), StorageError> {
    for user in &snapshot.users {
        storage.create_user(user.clone()).await?;
    }

    for car in &snapshot.cars {
        storage.create_car(car.clone()).await?;
    }

    for booking in &snapshot.bookings {
        let transaction = snapshot
            .transactions
            .iter()
            .find(|transaction| transaction.booking_uuid == booking.uuid)
            .cloned()
            .ok_or_else(|| {
                StorageError::Corrupt(format!("booking {} has no transaction", booking.uuid))
            })?;

        storage.create_booking(booking.clone(), transaction).await?;
    }

    storage.put_rules(snapshot.rules).await?;

    Ok(())
}
