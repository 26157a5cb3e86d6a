//! Car Records

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{domain::users::records::UserUuid, uuids::TypedUuid};

/// Car UUID
pub type CarUuid = TypedUuid<CarRecord>;

/// Listing approval state.
///
/// New listings start `Pending`; an admin moves them once to `Approved` or `Rejected`,
/// both of which are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarStatus {
    /// Awaiting admin review; not bookable.
    Pending,

    /// Discoverable and bookable.
    Approved,

    /// Declined by an admin.
    Rejected,
}

impl CarStatus {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown car status {other:?}")),
        }
    }
}

/// Gearbox type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transmission {
    /// Automatic gearbox.
    Automatic,

    /// Manual gearbox.
    Manual,
}

impl Transmission {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Manual => "Manual",
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transmission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown transmission {other:?}")),
        }
    }
}

/// Car Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    /// Unique listing identifier.
    #[serde(rename = "id")]
    pub uuid: CarUuid,

    /// Owner who listed the car.
    #[serde(rename = "ownerId")]
    pub owner_uuid: UserUuid,

    pub make: String,
    pub model: String,
    pub year: i16,
    pub transmission: Transmission,
    pub seats: u8,
    pub mileage: u32,
    pub description: String,

    /// Per-day rate in minor units.
    pub base_price: u64,

    pub images: Vec<String>,
    pub documents: Vec<String>,
    pub status: CarStatus,
    pub location: String,

    /// Body style, e.g. Sedan or SUV.
    #[serde(rename = "type")]
    pub car_type: String,
}

impl CarRecord {
    /// Text the renter search box matches against.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.make, self.model, self.location).to_lowercase()
    }
}
