//! Local storage: an in-memory marketplace, optionally snapshotted to a JSON file after
//! every change.

use std::path::PathBuf;

use async_trait::async_trait;
use driveshare::rules::PriceRules;
use rustc_hash::FxHashSet;
use tokio::{sync::RwLock, task};
use tracing::{debug, info, warn};

use crate::{
    domain::{
        bookings::records::{BookingRecord, BookingUuid},
        cars::records::{CarRecord, CarStatus, CarUuid},
        payouts::records::{PayoutStatus, TransactionRecord, TransactionUuid},
        users::records::{UserRecord, UserUuid},
    },
    storage::{BookingFilter, CarFilter, Storage, StorageError, TransactionFilter},
};

mod snapshot;

pub use snapshot::Snapshot;

#[derive(Debug)]
pub struct LocalStorage {
    state: RwLock<Snapshot>,
    path: Option<PathBuf>,
}

impl LocalStorage {
    /// Keep `snapshot` in memory only.
    #[must_use]
    pub fn in_memory(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            path: None,
        }
    }

    /// In-memory storage holding the seed marketplace.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded seed fixture does not parse.
    pub fn seeded() -> Result<Self, StorageError> {
        Ok(Self::in_memory(Snapshot::seed()?))
    }

    /// Load the snapshot at `path`, seeding and writing it first if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, decoded or created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let snapshot = if let Some(snapshot) = Snapshot::read(&path)? {
            debug!(path = %path.display(), "loaded marketplace snapshot");
            snapshot
        } else {
            let snapshot = Snapshot::seed()?;
            snapshot.write(&path)?;
            info!(path = %path.display(), "seeded new marketplace snapshot");
            snapshot
        };

        Ok(Self {
            state: RwLock::new(snapshot),
            path: Some(path),
        })
    }

    /// A copy of the current contents.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    /// Apply `change` and persist the result. When persisting fails the in-memory state is
    /// rolled back, so memory never runs ahead of the file.
    ///
    /// The file is written on the blocking pool while the write lock is held, so snapshots
    /// reach the disk in the order the changes were made.
    async fn mutate<T, F>(&self, change: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Snapshot) -> Result<T, StorageError> + Send,
    {
        let mut state = self.state.write().await;
        let previous = state.clone();

        let value = change(&mut state)?;

        if let Some(path) = &self.path
            && *state != previous
            && let Err(error) = persist(state.clone(), path.clone()).await
        {
            warn!(path = %path.display(), %error, "snapshot write failed; rolling back");
            *state = previous;
            return Err(error);
        }

        Ok(value)
    }
}

async fn persist(snapshot: Snapshot, path: PathBuf) -> Result<(), StorageError> {
    task::spawn_blocking(move || snapshot.write(&path))
        .await
        .map_err(|error| StorageError::Unavailable(format!("snapshot writer stopped: {error}")))?
}

fn owned_cars(state: &Snapshot, owner: UserUuid) -> FxHashSet<CarUuid> {
    state
        .cars
        .iter()
        .filter(|car| car.owner_uuid == owner)
        .map(|car| car.uuid)
        .collect()
}

fn booking_matches(
    booking: &BookingRecord,
    filter: &BookingFilter,
    owned: Option<&FxHashSet<CarUuid>>,
) -> bool {
    filter.renter.is_none_or(|renter| booking.renter_uuid == renter)
        && filter.car.is_none_or(|car| booking.car_uuid == car)
        && owned.is_none_or(|owned| owned.contains(&booking.car_uuid))
}

#[async_trait]
impl Storage for LocalStorage {
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, StorageError> {
        let state = self.state.read().await;

        state
            .users
            .iter()
            .find(|record| record.uuid == user)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let state = self.state.read().await;

        Ok(state
            .users
            .iter()
            .find(|record| record.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(self.state.read().await.users.clone())
    }

    async fn create_user(&self, user: UserRecord) -> Result<UserRecord, StorageError> {
        self.mutate(|state| {
            if state.users.iter().any(|record| {
                record.uuid == user.uuid || record.email.eq_ignore_ascii_case(&user.email)
            }) {
                return Err(StorageError::AlreadyExists);
            }

            state.users.push(user.clone());

            Ok(user)
        })
        .await
    }

    async fn list_cars(&self, filter: CarFilter) -> Result<Vec<CarRecord>, StorageError> {
        let state = self.state.read().await;

        Ok(state
            .cars
            .iter()
            .filter(|car| filter.status.is_none_or(|status| car.status == status))
            .filter(|car| filter.owner.is_none_or(|owner| car.owner_uuid == owner))
            .cloned()
            .collect())
    }

    async fn get_car(&self, car: CarUuid) -> Result<CarRecord, StorageError> {
        let state = self.state.read().await;

        state
            .cars
            .iter()
            .find(|record| record.uuid == car)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn create_car(&self, car: CarRecord) -> Result<CarRecord, StorageError> {
        self.mutate(|state| {
            if state.cars.iter().any(|record| record.uuid == car.uuid) {
                return Err(StorageError::AlreadyExists);
            }

            if !state.users.iter().any(|user| user.uuid == car.owner_uuid) {
                return Err(StorageError::InvalidReference);
            }

            state.cars.push(car.clone());

            Ok(car)
        })
        .await
    }

    async fn transition_car_status(
        &self,
        car: CarUuid,
        from: CarStatus,
        to: CarStatus,
    ) -> Result<bool, StorageError> {
        self.mutate(|state| {
            let record = state
                .cars
                .iter_mut()
                .find(|record| record.uuid == car)
                .ok_or(StorageError::NotFound)?;

            if record.status != from {
                return Ok(false);
            }

            record.status = to;

            Ok(true)
        })
        .await
    }

    async fn list_bookings(
        &self,
        filter: BookingFilter,
    ) -> Result<Vec<BookingRecord>, StorageError> {
        let state = self.state.read().await;
        let owned = filter.car_owner.map(|owner| owned_cars(&state, owner));

        Ok(state
            .bookings
            .iter()
            .filter(|booking| booking_matches(booking, &filter, owned.as_ref()))
            .cloned()
            .collect())
    }

    async fn get_booking(&self, booking: BookingUuid) -> Result<BookingRecord, StorageError> {
        let state = self.state.read().await;

        state
            .bookings
            .iter()
            .find(|record| record.uuid == booking)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn create_booking(
        &self,
        booking: BookingRecord,
        transaction: TransactionRecord,
    ) -> Result<(), StorageError> {
        self.mutate(|state| {
            if transaction.booking_uuid != booking.uuid {
                return Err(StorageError::InvalidReference);
            }

            if state.bookings.iter().any(|record| record.uuid == booking.uuid)
                || state
                    .transactions
                    .iter()
                    .any(|record| record.uuid == transaction.uuid)
            {
                return Err(StorageError::AlreadyExists);
            }

            let renter_exists = state.users.iter().any(|user| user.uuid == booking.renter_uuid);
            let car_exists = state.cars.iter().any(|car| car.uuid == booking.car_uuid);

            if !renter_exists || !car_exists {
                return Err(StorageError::InvalidReference);
            }

            state.bookings.push(booking);
            state.transactions.push(transaction);

            Ok(())
        })
        .await
    }

    async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionRecord>, StorageError> {
        let state = self.state.read().await;

        let scoped = filter.renter.is_some() || filter.car_owner.is_some();

        let bookings: FxHashSet<BookingUuid> = if scoped {
            let booking_filter = BookingFilter {
                renter: filter.renter,
                car_owner: filter.car_owner,
                ..BookingFilter::default()
            };
            let owned = filter.car_owner.map(|owner| owned_cars(&state, owner));

            state
                .bookings
                .iter()
                .filter(|booking| booking_matches(booking, &booking_filter, owned.as_ref()))
                .map(|booking| booking.uuid)
                .collect()
        } else {
            FxHashSet::default()
        };

        Ok(state
            .transactions
            .iter()
            .filter(|tx| filter.booking.is_none_or(|booking| tx.booking_uuid == booking))
            .filter(|tx| filter.payout_status.is_none_or(|status| tx.payout_status == status))
            .filter(|tx| !scoped || bookings.contains(&tx.booking_uuid))
            .cloned()
            .collect())
    }

    async fn get_transaction(
        &self,
        transaction: TransactionUuid,
    ) -> Result<TransactionRecord, StorageError> {
        let state = self.state.read().await;

        state
            .transactions
            .iter()
            .find(|record| record.uuid == transaction)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn mark_payout_paid(&self, transaction: TransactionUuid) -> Result<bool, StorageError> {
        self.mutate(|state| {
            let record = state
                .transactions
                .iter_mut()
                .find(|record| record.uuid == transaction)
                .ok_or(StorageError::NotFound)?;

            if record.payout_status == PayoutStatus::Paid {
                return Ok(false);
            }

            record.payout_status = PayoutStatus::Paid;

            Ok(true)
        })
        .await
    }

    async fn get_rules(&self) -> Result<PriceRules, StorageError> {
        Ok(self.state.read().await.rules)
    }

    async fn put_rules(&self, rules: PriceRules) -> Result<PriceRules, StorageError> {
        self.mutate(|state| {
            state.rules = rules;

            Ok(rules)
        })
        .await
    }
}
