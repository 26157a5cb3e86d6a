use std::error::Error;

use clap::{Parser, Subcommand};
use driveshare_app::{
    config::{LoggingConfig, PricingConfig, StorageConfig},
    context::AppContext,
    domain::{Actor, describe, users::records::UserUuid},
    observability,
};

mod bookings;
mod cars;
mod db;
mod output;
mod payouts;
mod rules;
mod stats;
mod users;

#[derive(Debug, Parser)]
#[command(name = "driveshare", about = "DriveShare marketplace CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    storage: StorageConfig,

    #[command(flatten)]
    pricing: PricingConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    /// Act as this user; anonymous when omitted
    #[arg(long = "as", env = "DRIVESHARE_USER", global = true)]
    user: Option<UserUuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Cars(cars::CarsCommand),
    Bookings(bookings::BookingsCommand),
    Payouts(payouts::PayoutsCommand),
    Rules(rules::RulesCommand),
    Users(users::UsersCommand),
    /// Marketplace totals (admin only)
    Stats,
    Db(db::DbCommand),
}

/// Services opened on the configured backend, and who is calling them.
pub(crate) struct Session {
    pub(crate) app: AppContext,
    pub(crate) actor: Actor,
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.logging)
            .map_err(failed("initialise logging"))?;

        let Self {
            storage,
            pricing,
            user,
            command,
            ..
        } = self;

        match command {
            Commands::Db(command) => db::run(command, &storage).await,
            Commands::Cars(command) => {
                cars::run(command, &open(&storage, &pricing, user).await?).await
            }
            Commands::Bookings(command) => {
                bookings::run(command, &open(&storage, &pricing, user).await?).await
            }
            Commands::Payouts(command) => {
                payouts::run(command, &open(&storage, &pricing, user).await?).await
            }
            Commands::Rules(command) => {
                rules::run(command, &open(&storage, &pricing, user).await?).await
            }
            Commands::Users(command) => {
                users::run(command, &open(&storage, &pricing, user).await?).await
            }
            Commands::Stats => stats::run(&open(&storage, &pricing, user).await?).await,
        }
    }
}

/// Message printed when `action` fails with `error`, causes included.
pub(crate) fn failed<E: Error + 'static>(action: &str) -> impl FnOnce(E) -> String + '_ {
    move |error| format!("failed to {action}: {}", describe(&error))
}

async fn open(
    storage: &StorageConfig,
    pricing: &PricingConfig,
    user: Option<UserUuid>,
) -> Result<Session, String> {
    let app = AppContext::from_config(storage, pricing)
        .await
        .map_err(failed("open storage"))?;

    let actor = app
        .users
        .resolve_actor(user)
        .await
        .map_err(failed("resolve caller"))?;

    Ok(Session { app, actor })
}
