//! Local snapshot file.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use driveshare::rules::PriceRules;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{
    domain::{
        bookings::records::BookingRecord, cars::records::CarRecord,
        payouts::records::TransactionRecord, users::records::UserRecord,
    },
    storage::StorageError,
};

const SEED_YAML: &str = include_str!("../../../fixtures/seed.yaml");

/// Every record the local backend holds, in the shape written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub users: Vec<UserRecord>,
    pub cars: Vec<CarRecord>,
    pub bookings: Vec<BookingRecord>,
    pub transactions: Vec<TransactionRecord>,
    pub rules: PriceRules,
}

impl Snapshot {
    /// The initial marketplace contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded fixture does not parse.
    pub fn seed() -> Result<Self, StorageError> {
        Ok(serde_norway::from_str(SEED_YAML)?)
    }

    /// Read a snapshot file, returning `None` if it does not exist.
    pub(super) fn read(path: &Path) -> Result<Option<Self>, StorageError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Write the snapshot to `path` atomically: temp file in the same directory, fsync,
    /// then rename over the destination.
    pub(super) fn write(&self, path: &Path) -> Result<(), StorageError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let bytes = serde_json::to_vec_pretty(self)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.as_file_mut().write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|error| StorageError::Io(error.error))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::{cars::records::CarStatus, users::records::Role};

    use super::*;

    #[test]
    fn seed_contains_one_user_per_role() -> TestResult {
        let seed = Snapshot::seed()?;

        let roles: Vec<Role> = seed.users.iter().map(|user| user.role).collect();

        assert_eq!(roles, vec![Role::Admin, Role::Owner, Role::Renter]);

        Ok(())
    }

    #[test]
    fn seed_has_one_listing_awaiting_approval() -> TestResult {
        let seed = Snapshot::seed()?;

        let pending: Vec<&str> = seed
            .cars
            .iter()
            .filter(|car| car.status == CarStatus::Pending)
            .map(|car| car.make.as_str())
            .collect();

        assert_eq!(pending, vec!["Land Rover"]);
        assert_eq!(seed.rules, PriceRules::default());

        Ok(())
    }

    #[test]
    fn write_then_read_restores_snapshot() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("marketplace.json");
        let seed = Snapshot::seed()?;

        seed.write(&path)?;

        assert_eq!(Snapshot::read(&path)?, Some(seed));

        Ok(())
    }

    #[test]
    fn missing_file_reads_as_none() -> TestResult {
        let dir = tempfile::tempdir()?;

        assert_eq!(Snapshot::read(&dir.path().join("absent.json"))?, None);

        Ok(())
    }

    #[test]
    fn written_file_uses_marketplace_field_names() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("marketplace.json");

        Snapshot::seed()?.write(&path)?;

        let json: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;

        assert_eq!(json["rules"]["depositFee"], 50_000);
        assert_eq!(json["cars"][0]["basePrice"], 12_000);
        assert_eq!(json["cars"][0]["type"], "Sedan");
        assert!(json["cars"][0]["ownerId"].is_string());

        Ok(())
    }
}
