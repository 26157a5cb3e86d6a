//! User Records

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::uuids::TypedUuid;

/// User UUID
pub type UserUuid = TypedUuid<UserRecord>;

/// Marketplace role, fixed when the profile is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Approves listings, configures pricing and releases payouts.
    Admin,

    /// Lists cars for rent.
    Owner,

    /// Books cars.
    Renter,
}

impl Role {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Owner => "OWNER",
            Self::Renter => "RENTER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "OWNER" => Ok(Self::Owner),
            "RENTER" => Ok(Self::Renter),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// User Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Unique user identifier.
    #[serde(rename = "id")]
    pub uuid: UserUuid,

    /// Display name.
    pub name: String,

    /// Contact email, unique across users.
    pub email: String,

    /// Marketplace role.
    pub role: Role,

    /// Optional avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}
