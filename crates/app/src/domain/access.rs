//! Actors and capabilities.
//!
//! Every service call receives the calling [`Actor`] explicitly. Operations declare the
//! [`Capability`] they need and check it through [`Actor::require`].

use std::fmt;

use thiserror::Error;

use crate::domain::users::records::{Role, UserUuid};

/// Refused access.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccessError {
    /// No user is signed in.
    #[error("sign in required")]
    Unauthenticated,

    /// The signed-in user's role does not grant the capability.
    #[error("{role} may not {capability}")]
    Forbidden {
        /// Role of the caller.
        role: Role,
        /// Capability that was required.
        capability: Capability,
    },
}

/// Something an operation requires of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any signed-in user.
    Authenticated,

    /// Owners listing their cars.
    ListCars,

    /// Admin console actions.
    Administer,
}

impl Capability {
    /// Whether the role grants this capability.
    pub fn granted_to(self, role: Role) -> bool {
        match self {
            Self::Authenticated => true,
            Self::ListCars => role == Role::Owner,
            Self::Administer => role == Role::Admin,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Authenticated => "use the marketplace",
            Self::ListCars => "list cars",
            Self::Administer => "administer the marketplace",
        })
    }
}

/// Which bookings and transactions a caller may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every record.
    Everything,

    /// Records where the user is the renter or owns the booked car.
    PartyTo(UserUuid),
}

/// The caller of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Actor {
    /// Nobody is signed in.
    #[default]
    Anonymous,

    /// A signed-in user.
    User { uuid: UserUuid, role: Role },
}

impl Actor {
    /// A signed-in user with the given role.
    pub fn user(uuid: UserUuid, role: Role) -> Self {
        Self::User { uuid, role }
    }

    /// The signed-in user's id, if any.
    pub fn uuid(&self) -> Option<UserUuid> {
        match self {
            Self::Anonymous => None,
            Self::User { uuid, .. } => Some(*uuid),
        }
    }

    /// The signed-in user's role, if any.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::User { role, .. } => Some(*role),
        }
    }

    /// Whether the caller holds `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        self.require(capability).is_ok()
    }

    /// Check the caller holds `capability`, returning their id.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] for anonymous callers and
    /// [`AccessError::Forbidden`] when the role lacks the capability.
    pub fn require(&self, capability: Capability) -> Result<UserUuid, AccessError> {
        match *self {
            Self::Anonymous => Err(AccessError::Unauthenticated),
            Self::User { uuid, role } if capability.granted_to(role) => Ok(uuid),
            Self::User { role, .. } => Err(AccessError::Forbidden { role, capability }),
        }
    }

    /// Booking and transaction records the caller may read.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] for anonymous callers.
    pub fn visibility(&self) -> Result<Visibility, AccessError> {
        let uuid = self.require(Capability::Authenticated)?;

        if self.can(Capability::Administer) {
            Ok(Visibility::Everything)
        } else {
            Ok(Visibility::PartyTo(uuid))
        }
    }
}
