//! App Context

use std::sync::Arc;

use driveshare::pricing::PricingPolicy;
use thiserror::Error;
use tracing::info;

use crate::{
    config::{Backend, PricingConfig, StorageConfig},
    database,
    domain::{
        bookings::{BookingsService, StorageBookingsService},
        cars::{CarsService, StorageCarsService},
        payouts::{PayoutsService, StoragePayoutsService},
        reports::{ReportsService, StorageReportsService},
        rules::{RulesService, StorageRulesService},
        users::{StorageUsersService, UsersService},
    },
    storage::{LocalStorage, PgStorage, Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("the postgres backend needs --database-url or DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("failed to open local store")]
    Storage(#[source] StorageError),
}

#[derive(Clone)]
pub struct AppContext {
    pub users: Arc<dyn UsersService>,
    pub cars: Arc<dyn CarsService>,
    pub bookings: Arc<dyn BookingsService>,
    pub payouts: Arc<dyn PayoutsService>,
    pub rules: Arc<dyn RulesService>,
    pub reports: Arc<dyn ReportsService>,
    pub storage: Arc<dyn Storage>,
}

impl AppContext {
    /// Build every service over one storage backend.
    #[must_use]
    pub fn from_storage(storage: Arc<dyn Storage>, policy: PricingPolicy) -> Self {
        Self {
            users: Arc::new(StorageUsersService::new(storage.clone())),
            cars: Arc::new(StorageCarsService::new(storage.clone())),
            bookings: Arc::new(StorageBookingsService::new(storage.clone(), policy)),
            payouts: Arc::new(StoragePayoutsService::new(storage.clone())),
            rules: Arc::new(StorageRulesService::new(storage.clone())),
            reports: Arc::new(StorageReportsService::new(storage.clone())),
            storage,
        }
    }

    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the local snapshot cannot be opened or the database cannot be
    /// reached.
    pub async fn from_config(
        storage: &StorageConfig,
        pricing: &PricingConfig,
    ) -> Result<Self, AppInitError> {
        let backend: Arc<dyn Storage> = match storage.backend {
            Backend::Local => {
                info!(path = %storage.data_file.display(), "using local storage");

                Arc::new(LocalStorage::open(&storage.data_file).map_err(AppInitError::Storage)?)
            }
            Backend::Postgres => {
                let url = storage
                    .database_url
                    .as_deref()
                    .ok_or(AppInitError::MissingDatabaseUrl)?;

                let pool = database::connect(url)
                    .await
                    .map_err(AppInitError::Database)?;

                info!("using postgres storage");

                Arc::new(PgStorage::new(pool))
            }
        };

        Ok(Self::from_storage(backend, pricing.policy()))
    }
}
