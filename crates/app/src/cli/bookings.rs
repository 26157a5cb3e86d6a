use clap::{Args, Subcommand};
use driveshare_app::domain::{
    bookings::{
        BookingsService,
        data::{BookingQuery, BookingRequest},
    },
    cars::records::CarUuid,
};
use jiff::civil::Date;

use crate::cli::{
    Session, failed,
    output::{fields, money, table},
};

#[derive(Debug, Args)]
pub(crate) struct BookingsCommand {
    #[command(subcommand)]
    command: BookingsSubcommand,
}

#[derive(Debug, Subcommand)]
enum BookingsSubcommand {
    /// Price a stay without booking it
    Quote(StayArgs),
    /// Book a car and pay for it
    Create(StayArgs),
    /// Bookings you made or that were made on your cars
    List(ListArgs),
}

#[derive(Debug, Args)]
struct StayArgs {
    /// Car UUID
    #[arg(long)]
    car: CarUuid,

    /// First day of the stay (YYYY-MM-DD)
    #[arg(long)]
    start: Date,

    /// Last day of the stay (YYYY-MM-DD)
    #[arg(long)]
    end: Date,
}

impl From<StayArgs> for BookingRequest {
    fn from(args: StayArgs) -> Self {
        Self {
            car: args.car,
            start: args.start,
            end: args.end,
        }
    }
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only bookings of this car
    #[arg(long)]
    car: Option<CarUuid>,
}

pub(crate) async fn run(command: BookingsCommand, session: &Session) -> Result<(), String> {
    let bookings = &session.app.bookings;

    match command.command {
        BookingsSubcommand::Quote(args) => {
            let quote = bookings
                .quote(session.actor, args.into())
                .await
                .map_err(failed("quote stay"))?;

            fields([
                ("days", quote.days.to_string()),
                ("rental", quote.rental.to_string()),
                ("deposit", quote.deposit.to_string()),
                ("total", quote.total.to_string()),
            ]);
        }
        BookingsSubcommand::Create(args) => {
            let confirmed = bookings
                .create_booking(session.actor, args.into())
                .await
                .map_err(failed("create booking"))?;

            fields([
                ("booking_uuid", confirmed.booking.uuid.to_string()),
                ("transaction_uuid", confirmed.transaction.uuid.to_string()),
                ("status", confirmed.booking.status.to_string()),
                ("total", money(confirmed.booking.total_price)),
            ]);
        }
        BookingsSubcommand::List(args) => {
            let listed = bookings
                .list_bookings(session.actor, BookingQuery { car: args.car })
                .await
                .map_err(failed("list bookings"))?;

            if listed.is_empty() {
                println!("no bookings found");
                return Ok(());
            }

            let rows = listed.iter().map(|booking| {
                [
                    booking.uuid.to_string(),
                    booking.car_uuid.to_string(),
                    booking.renter_uuid.to_string(),
                    booking.start_date.to_string(),
                    booking.end_date.to_string(),
                    booking.status.to_string(),
                    money(booking.total_price),
                ]
            });

            println!(
                "{}",
                table(
                    ["Booking", "Car", "Renter", "From", "To", "Status", "Total"],
                    rows,
                    6..7,
                )
            );
        }
    }

    Ok(())
}
