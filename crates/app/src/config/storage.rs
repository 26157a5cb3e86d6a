//! Storage Config

use std::path::PathBuf;

use clap::Args;

/// Where marketplace records are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// In-process store snapshotted to a local JSON file.
    #[default]
    Local,

    /// PostgreSQL database.
    Postgres,
}

/// Storage settings.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Storage backend (local, postgres)
    #[arg(
        long,
        env = "DRIVESHARE_BACKEND",
        value_enum,
        default_value_t = Backend::Local,
        global = true
    )]
    pub backend: Backend,

    /// Snapshot file used by the local backend
    #[arg(
        long,
        env = "DRIVESHARE_DATA_FILE",
        default_value = "driveshare_db_v1.json",
        global = true
    )]
    pub data_file: PathBuf,

    /// `PostgreSQL` connection string, required by the postgres backend
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,
}
