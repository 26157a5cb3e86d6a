//! Payout Data

use driveshare::settlement::Split;

use crate::domain::{
    bookings::records::{BookingRecord, BookingUuid},
    cars::records::CarRecord,
    payouts::records::{PayoutStatus, TransactionRecord},
    users::records::UserRecord,
};

/// A transaction awaiting payout, with the records the admin needs to release it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPayout {
    pub transaction: TransactionRecord,
    pub booking: BookingRecord,
    pub car: CarRecord,

    /// Missing when the owner profile has been removed from the backend.
    pub owner: Option<UserRecord>,

    pub split: Split,
}

/// Result of a payout release request.
#[derive(Debug, Clone, PartialEq)]
pub enum PayoutRelease {
    /// The payout moved from pending to paid by this call.
    Released(TransactionRecord),

    /// The payout had already been released; nothing changed.
    AlreadyPaid(TransactionRecord),
}

impl PayoutRelease {
    /// The transaction after the request.
    pub fn transaction(&self) -> &TransactionRecord {
        match self {
            Self::Released(transaction) | Self::AlreadyPaid(transaction) => transaction,
        }
    }
}

/// Transaction listing filters, applied within the caller's visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionQuery {
    /// Only the transaction for this booking.
    pub booking: Option<BookingUuid>,

    /// Only transactions in this payout state.
    pub payout_status: Option<PayoutStatus>,
}
