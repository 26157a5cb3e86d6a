//! Cars service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tracing::{info, instrument, warn};

use crate::{
    domain::{
        access::{Actor, Capability},
        cars::{
            data::{CarQuery, CarSearch, NewCar},
            records::{CarRecord, CarStatus, CarUuid},
        },
        errors::{Entity, MarketplaceError, StorageResultExt},
        users::records::Role,
    },
    storage::{CarFilter, Storage},
};

#[derive(Clone)]
pub struct StorageCarsService {
    storage: Arc<dyn Storage>,
}

impl StorageCarsService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

/// Whether `actor` may see `car`: approved listings are public, the rest only to their
/// owner and to admins.
pub(crate) fn is_visible_to(car: &CarRecord, actor: Actor) -> bool {
    car.status == CarStatus::Approved
        || actor.role() == Some(Role::Admin)
        || actor.uuid() == Some(car.owner_uuid)
}

fn matches_search(car: &CarRecord, search: &CarSearch, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| car.search_text().contains(needle))
        && search
            .car_type
            .as_deref()
            .is_none_or(|car_type| car.car_type.eq_ignore_ascii_case(car_type))
        && search
            .transmission
            .is_none_or(|transmission| car.transmission == transmission)
        && search
            .max_price
            .is_none_or(|max_price| car.base_price <= max_price)
}

fn validate(car: &NewCar) -> Result<(), MarketplaceError> {
    if car.make.trim().is_empty() || car.model.trim().is_empty() {
        return Err(MarketplaceError::Validation(
            "make and model are required".to_string(),
        ));
    }

    if car.base_price == 0 {
        return Err(MarketplaceError::Validation(
            "base price must be greater than zero".to_string(),
        ));
    }

    if car.seats == 0 {
        return Err(MarketplaceError::Validation(
            "a car needs at least one seat".to_string(),
        ));
    }

    Ok(())
}

#[async_trait]
impl CarsService for StorageCarsService {
    async fn list_cars(
        &self,
        actor: Actor,
        query: CarQuery,
    ) -> Result<Vec<CarRecord>, MarketplaceError> {
        let mut cars = self
            .storage
            .list_cars(CarFilter {
                status: query.status,
                owner: query.owner,
            })
            .await?;

        cars.retain(|car| is_visible_to(car, actor));

        Ok(cars)
    }

    async fn search_cars(&self, search: CarSearch) -> Result<Vec<CarRecord>, MarketplaceError> {
        let needle = search
            .text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);

        let mut cars = self
            .storage
            .list_cars(CarFilter {
                status: Some(CarStatus::Approved),
                owner: None,
            })
            .await?;

        cars.retain(|car| matches_search(car, &search, needle.as_deref()));

        Ok(cars)
    }

    async fn get_car(&self, actor: Actor, car: CarUuid) -> Result<CarRecord, MarketplaceError> {
        let record = self.storage.get_car(car).await.or_not_found(Entity::Car)?;

        if !is_visible_to(&record, actor) {
            return Err(MarketplaceError::NotFound(Entity::Car));
        }

        Ok(record)
    }

    #[instrument(skip(self, car), fields(car = %car.uuid))]
    async fn add_car(&self, actor: Actor, car: NewCar) -> Result<CarRecord, MarketplaceError> {
        let owner = actor.require(Capability::ListCars)?;

        validate(&car)?;

        if let Some(status) = car.status
            && status != CarStatus::Pending
        {
            warn!(%status, "ignoring requested status on new listing");
        }

        let record = CarRecord {
            uuid: car.uuid,
            owner_uuid: owner,
            make: car.make.trim().to_string(),
            model: car.model.trim().to_string(),
            year: car.year,
            transmission: car.transmission,
            seats: car.seats,
            mileage: car.mileage,
            description: car.description,
            base_price: car.base_price,
            images: car.images,
            documents: car.documents,
            status: CarStatus::Pending,
            location: car.location,
            car_type: car.car_type,
        };

        let created = self
            .storage
            .create_car(record)
            .await
            .or_not_found(Entity::Car)?;

        info!(owner = %owner, "listed car for approval");

        Ok(created)
    }

    #[instrument(skip(self))]
    async fn set_car_status(
        &self,
        actor: Actor,
        car: CarUuid,
        status: CarStatus,
    ) -> Result<CarRecord, MarketplaceError> {
        actor.require(Capability::Administer)?;

        if status == CarStatus::Pending {
            return Err(MarketplaceError::Validation(
                "a listing can only be approved or rejected".to_string(),
            ));
        }

        let changed = self
            .storage
            .transition_car_status(car, CarStatus::Pending, status)
            .await
            .or_not_found(Entity::Car)?;

        let record = self.storage.get_car(car).await.or_not_found(Entity::Car)?;

        if !changed {
            warn!(current = %record.status, "car is no longer awaiting review");

            return Err(MarketplaceError::InvalidState(format!(
                "car is already {}",
                record.status
            )));
        }

        info!("car review recorded");

        Ok(record)
    }

    async fn pending_cars(&self, actor: Actor) -> Result<Vec<CarRecord>, MarketplaceError> {
        actor.require(Capability::Administer)?;

        Ok(self
            .storage
            .list_cars(CarFilter {
                status: Some(CarStatus::Pending),
                owner: None,
            })
            .await?)
    }
}

#[automock]
#[async_trait]
pub trait CarsService: Send + Sync {
    /// Retrieve the cars the caller is allowed to see, narrowed by `query`.
    async fn list_cars(&self, actor: Actor, query: CarQuery)
    -> Result<Vec<CarRecord>, MarketplaceError>;

    /// Search approved listings.
    async fn search_cars(&self, search: CarSearch) -> Result<Vec<CarRecord>, MarketplaceError>;

    /// Retrieve a single car. Unapproved cars look missing to everyone but their owner and
    /// admins.
    async fn get_car(&self, actor: Actor, car: CarUuid) -> Result<CarRecord, MarketplaceError>;

    /// List a car for the calling owner. The listing always starts pending.
    async fn add_car(&self, actor: Actor, car: NewCar) -> Result<CarRecord, MarketplaceError>;

    /// Approve or reject a pending listing (admin only).
    async fn set_car_status(
        &self,
        actor: Actor,
        car: CarUuid,
        status: CarStatus,
    ) -> Result<CarRecord, MarketplaceError>;

    /// Listings awaiting review (admin only).
    async fn pending_cars(&self, actor: Actor) -> Result<Vec<CarRecord>, MarketplaceError>;
}
