//! DriveShare prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    pricing::{CURRENCY, PricingError, PricingMode, PricingPolicy, Quote, compute_total},
    rules::{PriceRules, RulesError, Season},
    settlement::{SettlementError, Split, host_share},
    stays::{Stay, StayError, parse_date},
};
