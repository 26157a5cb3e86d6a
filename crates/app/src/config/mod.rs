//! Application configuration

pub mod logging;
pub mod pricing;
pub mod storage;

pub use logging::{LogFormat, LoggingConfig};
pub use pricing::{PricingConfig, PricingModeArg};
pub use storage::{Backend, StorageConfig};
