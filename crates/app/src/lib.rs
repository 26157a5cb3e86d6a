//! DriveShare marketplace: domain services, storage backends and application wiring.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;
pub mod storage;

#[cfg(test)]
mod test;

mod uuids;
