//! Reports

pub mod data;
pub mod service;

pub use service::*;
