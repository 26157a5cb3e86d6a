//! Test context for service-level tests.

use std::sync::Arc;

use driveshare::pricing::PricingPolicy;

use crate::{
    domain::{
        access::Actor,
        bookings::StorageBookingsService,
        cars::{
            StorageCarsService,
            records::{CarStatus, CarUuid},
        },
        errors::MarketplaceError,
        payouts::StoragePayoutsService,
        reports::StorageReportsService,
        rules::StorageRulesService,
        users::{
            StorageUsersService, UsersService,
            data::NewUser,
            records::{Role, UserRecord, UserUuid},
        },
    },
    storage::{LocalStorage, Snapshot, StorageError},
};

/// Services over an in-memory copy of the seed marketplace, with one actor per seeded role.
pub struct TestContext {
    pub storage: Arc<LocalStorage>,
    pub seed: Snapshot,
    pub users: StorageUsersService,
    pub cars: StorageCarsService,
    pub bookings: StorageBookingsService,
    pub payouts: StoragePayoutsService,
    pub rules: StorageRulesService,
    pub reports: StorageReportsService,
    pub admin: Actor,
    pub owner: Actor,
    pub renter: Actor,
}

fn actor_with_role(users: &[UserRecord], role: Role) -> Result<Actor, StorageError> {
    users
        .iter()
        .find(|user| user.role == role)
        .map(|user| Actor::user(user.uuid, user.role))
        .ok_or_else(|| StorageError::Corrupt(format!("seed has no {role} user")))
}

impl TestContext {
    pub fn seeded() -> Result<Self, StorageError> {
        Self::with_policy(PricingPolicy::flat())
    }

    pub fn with_policy(policy: PricingPolicy) -> Result<Self, StorageError> {
        let seed = Snapshot::seed()?;
        let storage = Arc::new(LocalStorage::in_memory(seed.clone()));

        Ok(Self {
            users: StorageUsersService::new(storage.clone()),
            cars: StorageCarsService::new(storage.clone()),
            bookings: StorageBookingsService::new(storage.clone(), policy),
            payouts: StoragePayoutsService::new(storage.clone()),
            rules: StorageRulesService::new(storage.clone()),
            reports: StorageReportsService::new(storage.clone()),
            admin: actor_with_role(&seed.users, Role::Admin)?,
            owner: actor_with_role(&seed.users, Role::Owner)?,
            renter: actor_with_role(&seed.users, Role::Renter)?,
            storage,
            seed,
        })
    }

    /// The seeded Tesla, approved at 120.00 a day.
    pub fn tesla(&self) -> CarUuid {
        self.seed
            .cars
            .iter()
            .find(|car| car.make == "Tesla")
            .map(|car| car.uuid)
            .expect("seed lists a Tesla")
    }

    /// The seeded listing still awaiting review.
    pub fn pending_car(&self) -> CarUuid {
        self.seed
            .cars
            .iter()
            .find(|car| car.status == CarStatus::Pending)
            .map(|car| car.uuid)
            .expect("seed has a pending car")
    }

    /// Register another user and act as them.
    pub async fn register(&self, role: Role, email: &str) -> Result<Actor, MarketplaceError> {
        let user = self
            .users
            .register_user(NewUser {
                uuid: UserUuid::new(),
                name: String::new(),
                email: email.to_string(),
                role: Some(role),
                avatar: None,
            })
            .await?;

        Ok(Actor::user(user.uuid, user.role))
    }
}
