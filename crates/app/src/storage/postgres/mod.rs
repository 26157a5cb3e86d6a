//! PostgreSQL storage.

use std::str::FromStr;

use async_trait::async_trait;
use driveshare::rules::PriceRules;
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as};
use tracing::debug;

use crate::{
    domain::{
        bookings::records::{BookingRecord, BookingUuid},
        cars::records::{CarRecord, CarStatus, CarUuid},
        payouts::records::{TransactionRecord, TransactionUuid},
        users::records::{UserRecord, UserUuid},
    },
    storage::{BookingFilter, CarFilter, Storage, StorageError, TransactionFilter},
};

const GET_USER_SQL: &str = include_str!("sql/get_user.sql");
const FIND_USER_BY_EMAIL_SQL: &str = include_str!("sql/find_user_by_email.sql");
const LIST_USERS_SQL: &str = include_str!("sql/list_users.sql");
const CREATE_USER_SQL: &str = include_str!("sql/create_user.sql");
const LIST_CARS_SQL: &str = include_str!("sql/list_cars.sql");
const GET_CAR_SQL: &str = include_str!("sql/get_car.sql");
const CREATE_CAR_SQL: &str = include_str!("sql/create_car.sql");
const TRANSITION_CAR_STATUS_SQL: &str = include_str!("sql/transition_car_status.sql");
const LIST_BOOKINGS_SQL: &str = include_str!("sql/list_bookings.sql");
const GET_BOOKING_SQL: &str = include_str!("sql/get_booking.sql");
const CREATE_BOOKING_SQL: &str = include_str!("sql/create_booking.sql");
const CREATE_TRANSACTION_SQL: &str = include_str!("sql/create_transaction.sql");
const LIST_TRANSACTIONS_SQL: &str = include_str!("sql/list_transactions.sql");
const GET_TRANSACTION_SQL: &str = include_str!("sql/get_transaction.sql");
const MARK_PAYOUT_PAID_SQL: &str = include_str!("sql/mark_payout_paid.sql");
const GET_RULES_SQL: &str = include_str!("sql/get_rules.sql");
const PUT_RULES_SQL: &str = include_str!("sql/put_rules.sql");

#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn amount_to_sql(column: &str, amount: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_get_amount(row: &PgRow, column: &str) -> sqlx::Result<u64> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_get_parsed<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;

    raw.parse().map_err(|message: String| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: message.into(),
    })
}

impl<'r> FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: UserUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: try_get_parsed(row, "role")?,
            avatar: row.try_get("avatar")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CarRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let seats: i16 = row.try_get("seats")?;
        let mileage: i64 = row.try_get("mileage")?;

        Ok(Self {
            uuid: CarUuid::from_uuid(row.try_get("uuid")?),
            owner_uuid: UserUuid::from_uuid(row.try_get("owner_uuid")?),
            make: row.try_get("make")?,
            model: row.try_get("model")?,
            year: row.try_get("year")?,
            transmission: try_get_parsed(row, "transmission")?,
            seats: u8::try_from(seats).map_err(|e| sqlx::Error::ColumnDecode {
                index: "seats".to_string(),
                source: Box::new(e),
            })?,
            mileage: u32::try_from(mileage).map_err(|e| sqlx::Error::ColumnDecode {
                index: "mileage".to_string(),
                source: Box::new(e),
            })?,
            description: row.try_get("description")?,
            base_price: try_get_amount(row, "base_price")?,
            images: row.try_get("images")?,
            documents: row.try_get("documents")?,
            status: try_get_parsed(row, "status")?,
            location: row.try_get("location")?,
            car_type: row.try_get("car_type")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for BookingRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: BookingUuid::from_uuid(row.try_get("uuid")?),
            renter_uuid: UserUuid::from_uuid(row.try_get("renter_uuid")?),
            car_uuid: CarUuid::from_uuid(row.try_get("car_uuid")?),
            start_date: row.try_get::<SqlxDate, _>("start_date")?.to_jiff(),
            end_date: row.try_get::<SqlxDate, _>("end_date")?.to_jiff(),
            total_price: try_get_amount(row, "total_price")?,
            status: try_get_parsed(row, "status")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TransactionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TransactionUuid::from_uuid(row.try_get("uuid")?),
            booking_uuid: BookingUuid::from_uuid(row.try_get("booking_uuid")?),
            amount: try_get_amount(row, "amount")?,
            payment_status: try_get_parsed(row, "payment_status")?,
            payout_status: try_get_parsed(row, "payout_status")?,
        })
    }
}

fn rules_from_row(row: &PgRow) -> sqlx::Result<PriceRules> {
    Ok(PriceRules {
        weekend_multiplier: row.try_get::<Decimal, _>("weekend_multiplier")?,
        seasonal_multiplier: row.try_get::<Decimal, _>("seasonal_multiplier")?,
        deposit_fee: try_get_amount(row, "deposit_fee")?,
    })
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, StorageError> {
        Ok(query_as::<Postgres, UserRecord>(GET_USER_SQL)
            .bind(user.into_uuid())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(query_as::<Postgres, UserRecord>(FIND_USER_BY_EMAIL_SQL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StorageError> {
        Ok(query_as::<Postgres, UserRecord>(LIST_USERS_SQL)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: UserRecord) -> Result<UserRecord, StorageError> {
        Ok(query_as::<Postgres, UserRecord>(CREATE_USER_SQL)
            .bind(user.uuid.into_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .bind(user.avatar.as_deref())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_cars(&self, filter: CarFilter) -> Result<Vec<CarRecord>, StorageError> {
        Ok(query_as::<Postgres, CarRecord>(LIST_CARS_SQL)
            .bind(filter.status.map(CarStatus::as_str))
            .bind(filter.owner.map(UserUuid::into_uuid))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_car(&self, car: CarUuid) -> Result<CarRecord, StorageError> {
        Ok(query_as::<Postgres, CarRecord>(GET_CAR_SQL)
            .bind(car.into_uuid())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create_car(&self, car: CarRecord) -> Result<CarRecord, StorageError> {
        Ok(query_as::<Postgres, CarRecord>(CREATE_CAR_SQL)
            .bind(car.uuid.into_uuid())
            .bind(car.owner_uuid.into_uuid())
            .bind(&car.make)
            .bind(&car.model)
            .bind(car.year)
            .bind(car.transmission.as_str())
            .bind(i16::from(car.seats))
            .bind(i64::from(car.mileage))
            .bind(&car.description)
            .bind(amount_to_sql("base_price", car.base_price)?)
            .bind(&car.images)
            .bind(&car.documents)
            .bind(car.status.as_str())
            .bind(&car.location)
            .bind(&car.car_type)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn transition_car_status(
        &self,
        car: CarUuid,
        from: CarStatus,
        to: CarStatus,
    ) -> Result<bool, StorageError> {
        let rows_affected = query(TRANSITION_CAR_STATUS_SQL)
            .bind(car.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            // Distinguish a missing car from one in another state.
            self.get_car(car).await?;

            return Ok(false);
        }

        Ok(true)
    }

    async fn list_bookings(
        &self,
        filter: BookingFilter,
    ) -> Result<Vec<BookingRecord>, StorageError> {
        Ok(query_as::<Postgres, BookingRecord>(LIST_BOOKINGS_SQL)
            .bind(filter.renter.map(UserUuid::into_uuid))
            .bind(filter.car.map(CarUuid::into_uuid))
            .bind(filter.car_owner.map(UserUuid::into_uuid))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_booking(&self, booking: BookingUuid) -> Result<BookingRecord, StorageError> {
        Ok(query_as::<Postgres, BookingRecord>(GET_BOOKING_SQL)
            .bind(booking.into_uuid())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create_booking(
        &self,
        booking: BookingRecord,
        transaction: TransactionRecord,
    ) -> Result<(), StorageError> {
        if transaction.booking_uuid != booking.uuid {
            return Err(StorageError::InvalidReference);
        }

        let mut tx = self.pool.begin().await?;

        query(CREATE_BOOKING_SQL)
            .bind(booking.uuid.into_uuid())
            .bind(booking.renter_uuid.into_uuid())
            .bind(booking.car_uuid.into_uuid())
            .bind(SqlxDate::from(booking.start_date))
            .bind(SqlxDate::from(booking.end_date))
            .bind(amount_to_sql("total_price", booking.total_price)?)
            .bind(booking.status.as_str())
            .bind(SqlxTimestamp::from(booking.created_at))
            .execute(&mut *tx)
            .await?;

        query(CREATE_TRANSACTION_SQL)
            .bind(transaction.uuid.into_uuid())
            .bind(transaction.booking_uuid.into_uuid())
            .bind(amount_to_sql("amount", transaction.amount)?)
            .bind(transaction.payment_status.as_str())
            .bind(transaction.payout_status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(booking = %booking.uuid, transaction = %transaction.uuid, "booking rows committed");

        Ok(())
    }

    async fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<TransactionRecord>, StorageError> {
        Ok(query_as::<Postgres, TransactionRecord>(LIST_TRANSACTIONS_SQL)
            .bind(filter.booking.map(BookingUuid::into_uuid))
            .bind(filter.payout_status.map(|status| status.as_str()))
            .bind(filter.renter.map(UserUuid::into_uuid))
            .bind(filter.car_owner.map(UserUuid::into_uuid))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_transaction(
        &self,
        transaction: TransactionUuid,
    ) -> Result<TransactionRecord, StorageError> {
        Ok(query_as::<Postgres, TransactionRecord>(GET_TRANSACTION_SQL)
            .bind(transaction.into_uuid())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn mark_payout_paid(&self, transaction: TransactionUuid) -> Result<bool, StorageError> {
        let rows_affected = query(MARK_PAYOUT_PAID_SQL)
            .bind(transaction.into_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            self.get_transaction(transaction).await?;

            return Ok(false);
        }

        Ok(true)
    }

    async fn get_rules(&self) -> Result<PriceRules, StorageError> {
        let row = query(GET_RULES_SQL).fetch_one(&self.pool).await?;

        Ok(rules_from_row(&row)?)
    }

    async fn put_rules(&self, rules: PriceRules) -> Result<PriceRules, StorageError> {
        let row = query(PUT_RULES_SQL)
            .bind(rules.weekend_multiplier)
            .bind(rules.seasonal_multiplier)
            .bind(amount_to_sql("deposit_fee", rules.deposit_fee)?)
            .fetch_one(&self.pool)
            .await?;

        Ok(rules_from_row(&row)?)
    }
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, civil::date};
    use testresult::TestResult;

    use crate::{
        domain::{
            bookings::records::BookingStatus,
            payouts::records::{PaymentStatus, PayoutStatus},
            users::records::Role,
        },
        storage::Snapshot,
        test::TestDb,
    };

    use super::*;

    async fn seeded(db: &TestDb) -> Result<(PgStorage, Snapshot), StorageError> {
        let storage = PgStorage::new(db.pool().clone());
        let seed = Snapshot::seed()?;

        for user in &seed.users {
            storage.create_user(user.clone()).await?;
        }

        for car in &seed.cars {
            storage.create_car(car.clone()).await?;
        }

        Ok((storage, seed))
    }

    fn booking_pair(renter: UserUuid, car: CarUuid) -> (BookingRecord, TransactionRecord) {
        let booking = BookingRecord {
            uuid: BookingUuid::new(),
            renter_uuid: renter,
            car_uuid: car,
            start_date: date(2024, 6, 1),
            end_date: date(2024, 6, 4),
            total_price: 86_000,
            status: BookingStatus::Paid,
            created_at: Timestamp::now(),
        };

        let transaction = TransactionRecord {
            uuid: TransactionUuid::new(),
            booking_uuid: booking.uuid,
            amount: 86_000,
            payment_status: PaymentStatus::Success,
            payout_status: PayoutStatus::Pending,
        };

        (booking, transaction)
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn records_round_trip_through_postgres() -> TestResult {
        let db = TestDb::new().await;
        let (storage, seed) = seeded(&db).await?;

        assert_eq!(storage.list_users().await?, seed.users);
        assert_eq!(storage.list_cars(CarFilter::default()).await?, seed.cars);
        assert_eq!(storage.get_rules().await?, PriceRules::default());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn email_uniqueness_ignores_case() -> TestResult {
        let db = TestDb::new().await;
        let (storage, seed) = seeded(&db).await?;
        let mut duplicate = seed.users[2].clone();
        duplicate.uuid = UserUuid::new();
        duplicate.email = duplicate.email.to_uppercase();

        let result = storage.create_user(duplicate).await;

        assert!(matches!(result, Err(StorageError::AlreadyExists)));

        let found = storage.find_user_by_email("ALICE@RENTER.COM").await?;
        assert_eq!(found.map(|user| user.role), Some(Role::Renter));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn booking_and_transaction_commit_together() -> TestResult {
        let db = TestDb::new().await;
        let (storage, seed) = seeded(&db).await?;
        let (booking, transaction) = booking_pair(seed.users[2].uuid, seed.cars[0].uuid);

        storage
            .create_booking(booking.clone(), transaction.clone())
            .await?;

        assert_eq!(storage.get_booking(booking.uuid).await?.uuid, booking.uuid);
        assert_eq!(storage.get_transaction(transaction.uuid).await?, transaction);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn failed_transaction_insert_rolls_back_booking() -> TestResult {
        let db = TestDb::new().await;
        let (storage, seed) = seeded(&db).await?;
        let (first, first_tx) = booking_pair(seed.users[2].uuid, seed.cars[0].uuid);
        storage.create_booking(first, first_tx.clone()).await?;

        // Reusing the transaction id makes the second insert fail after the booking row.
        let (second, mut second_tx) = booking_pair(seed.users[2].uuid, seed.cars[1].uuid);
        second_tx.uuid = first_tx.uuid;

        let result = storage.create_booking(second.clone(), second_tx).await;

        assert!(matches!(result, Err(StorageError::AlreadyExists)));
        assert!(matches!(
            storage.get_booking(second.uuid).await,
            Err(StorageError::NotFound)
        ));

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn conditional_updates_report_changes() -> TestResult {
        let db = TestDb::new().await;
        let (storage, seed) = seeded(&db).await?;
        let pending = seed.cars[2].uuid;

        assert!(
            storage
                .transition_car_status(pending, CarStatus::Pending, CarStatus::Approved)
                .await?
        );
        assert!(
            !storage
                .transition_car_status(pending, CarStatus::Pending, CarStatus::Rejected)
                .await?
        );
        assert!(matches!(
            storage
                .transition_car_status(CarUuid::new(), CarStatus::Pending, CarStatus::Approved)
                .await,
            Err(StorageError::NotFound)
        ));

        let (booking, transaction) = booking_pair(seed.users[2].uuid, seed.cars[0].uuid);
        storage.create_booking(booking, transaction.clone()).await?;

        assert!(storage.mark_payout_paid(transaction.uuid).await?);
        assert!(!storage.mark_payout_paid(transaction.uuid).await?);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn transactions_filter_by_car_owner() -> TestResult {
        let db = TestDb::new().await;
        let (storage, seed) = seeded(&db).await?;
        let (booking, transaction) = booking_pair(seed.users[2].uuid, seed.cars[0].uuid);
        storage.create_booking(booking, transaction.clone()).await?;

        let owned = storage
            .list_transactions(TransactionFilter {
                car_owner: Some(seed.users[1].uuid),
                ..TransactionFilter::default()
            })
            .await?;
        let admin_owned = storage
            .list_transactions(TransactionFilter {
                car_owner: Some(seed.users[0].uuid),
                ..TransactionFilter::default()
            })
            .await?;

        assert_eq!(owned, vec![transaction]);
        assert!(admin_owned.is_empty());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn rules_are_replaced_in_place() -> TestResult {
        let db = TestDb::new().await;
        let storage = PgStorage::new(db.pool().clone());
        let rules = PriceRules::new(Decimal::new(15, 1), Decimal::ONE, 25_000)?;

        storage.put_rules(rules).await?;

        assert_eq!(storage.get_rules().await?, rules);

        Ok(())
    }
}
