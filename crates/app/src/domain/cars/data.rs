//! Car Data

use crate::domain::{
    cars::records::{CarStatus, CarUuid, Transmission},
    users::records::UserUuid,
};

/// New Car Data
///
/// `status` is whatever the client sent; listings are always stored as pending.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCar {
    pub uuid: CarUuid,
    pub make: String,
    pub model: String,
    pub year: i16,
    pub transmission: Transmission,
    pub seats: u8,
    pub mileage: u32,
    pub description: String,
    pub base_price: u64,
    pub images: Vec<String>,
    pub documents: Vec<String>,
    pub location: String,
    pub car_type: String,
    pub status: Option<CarStatus>,
}

/// Visibility-scoped car listing query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarQuery {
    /// Only cars in this state.
    pub status: Option<CarStatus>,

    /// Only cars listed by this owner.
    pub owner: Option<UserUuid>,
}

/// Renter search filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarSearch {
    /// Case-insensitive substring of "make model location".
    pub text: Option<String>,

    /// Exact body style.
    pub car_type: Option<String>,

    /// Exact gearbox type.
    pub transmission: Option<Transmission>,

    /// Highest acceptable per-day rate, inclusive, in minor units.
    pub max_price: Option<u64>,
}
