//! Report Data

use crate::domain::users::records::UserUuid;

/// What an owner has earned from bookings on their cars, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerEarnings {
    pub owner: UserUuid,

    /// Bookings made on the owner's cars.
    pub bookings: usize,

    /// Host share already paid out.
    pub released: u64,

    /// Host share awaiting release.
    pub pending: u64,
}

impl OwnerEarnings {
    /// Released and pending earnings together.
    pub fn total(&self) -> u64 {
        self.released.saturating_add(self.pending)
    }
}

/// Marketplace-wide figures for the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStats {
    /// Sum of every transaction amount, in minor units.
    pub total_revenue: u64,

    /// Platform share of `total_revenue`.
    pub platform_fees: u64,

    /// Listings awaiting review.
    pub pending_approvals: usize,

    /// Distinct renters with at least one booking.
    pub active_renters: usize,

    pub bookings: usize,
}
