//! DriveShare Domain Concerns

pub mod access;
pub mod bookings;
pub mod cars;
pub mod errors;
pub mod payouts;
pub mod reports;
pub mod rules;
pub mod users;

pub use access::{AccessError, Actor, Capability, Visibility};
pub use errors::{Entity, ErrorKind, MarketplaceError, describe};
