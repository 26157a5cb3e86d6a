//! Pricing Rules

pub mod service;

pub use service::*;
