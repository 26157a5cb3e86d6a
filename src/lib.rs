//! DriveShare
//!
//! Pricing and settlement core for a peer-to-peer car rental marketplace: stay intervals,
//! marketplace-wide pricing rules, booking quotes and the host/platform split of payments.

pub mod prelude;
pub mod pricing;
pub mod rules;
pub mod settlement;
pub mod stays;
