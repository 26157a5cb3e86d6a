//! Booking Data

use jiff::civil::Date;

use crate::domain::{
    bookings::records::BookingRecord, cars::records::CarUuid,
    payouts::records::TransactionRecord,
};

/// Booking request from the car detail panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingRequest {
    pub car: CarUuid,
    pub start: Date,
    pub end: Date,
}

/// A booking together with the payment recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedBooking {
    pub booking: BookingRecord,
    pub transaction: TransactionRecord,
}

/// Booking listing filters, applied within the caller's visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BookingQuery {
    /// Only bookings of this car.
    pub car: Option<CarUuid>,
}
