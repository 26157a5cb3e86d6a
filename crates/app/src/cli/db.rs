use clap::{Args, Subcommand};
use driveshare_app::{
    config::StorageConfig,
    database,
    storage::{self, PgStorage, Snapshot, Storage},
};
use sqlx::PgPool;

use crate::cli::failed;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Apply pending migrations
    Migrate,
    /// Migrate, then load the demo marketplace into an empty database
    Seed,
}

pub(crate) async fn run(command: DbCommand, config: &StorageConfig) -> Result<(), String> {
    let pool = connect(config).await?;

    database::migrate(&pool)
        .await
        .map_err(failed("run migrations"))?;

    match command.command {
        DbSubcommand::Migrate => println!("migrations applied"),
        DbSubcommand::Seed => seed(pool).await?,
    }

    Ok(())
}

async fn connect(config: &StorageConfig) -> Result<PgPool, String> {
    let url = config
        .database_url
        .as_deref()
        .ok_or("database_url is required (--database-url or DATABASE_URL)")?;

    database::connect(url)
        .await
        .map_err(failed("connect to database"))
}

async fn seed(pool: PgPool) -> Result<(), String> {
    let store = PgStorage::new(pool);

    let existing = store
        .list_users()
        .await
        .map_err(failed("inspect database"))?;

    if !existing.is_empty() {
        return Err(format!(
            "database already holds {} users; seed only loads into an empty database",
            existing.len()
        ));
    }

    let snapshot = Snapshot::seed().map_err(failed("load seed"))?;

    storage::import(&store, &snapshot)
        .await
        .map_err(failed("seed database"))?;

    println!(
        "seeded {} users, {} cars, {} bookings",
        snapshot.users.len(),
        snapshot.cars.len(),
        snapshot.bookings.len()
    );

    Ok(())
}
