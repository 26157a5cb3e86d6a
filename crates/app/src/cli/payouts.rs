use clap::{Args, Subcommand};
use driveshare::settlement::Split;
use driveshare_app::domain::{
    bookings::records::BookingUuid,
    payouts::{
        PayoutsService,
        data::{PayoutRelease, TransactionQuery},
        records::{PayoutStatus, TransactionUuid},
    },
    reports::ReportsService,
};

use crate::cli::{
    Session, failed,
    output::{fields, money, table},
};

#[derive(Debug, Args)]
pub(crate) struct PayoutsCommand {
    #[command(subcommand)]
    command: PayoutsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PayoutsSubcommand {
    /// Payouts awaiting release (admin only)
    Pending,
    /// Release the host's share of a transaction (admin only)
    Release(ReleaseArgs),
    /// Transactions on your bookings and cars
    Transactions(TransactionsArgs),
    /// Your earnings as an owner
    Earnings,
}

#[derive(Debug, Args)]
struct ReleaseArgs {
    /// Transaction UUID
    transaction: TransactionUuid,
}

#[derive(Debug, Args)]
struct TransactionsArgs {
    /// Only the transaction of this booking
    #[arg(long)]
    booking: Option<BookingUuid>,

    /// Only transactions in this payout state (pending, paid)
    #[arg(long)]
    payout_status: Option<PayoutStatus>,
}

pub(crate) async fn run(command: PayoutsCommand, session: &Session) -> Result<(), String> {
    let payouts = &session.app.payouts;
    let actor = session.actor;

    match command.command {
        PayoutsSubcommand::Pending => {
            let pending = payouts
                .pending_payouts(actor)
                .await
                .map_err(failed("list pending payouts"))?;

            if pending.is_empty() {
                println!("no payouts pending");
                return Ok(());
            }

            let rows = pending.iter().map(|payout| {
                [
                    payout.transaction.uuid.to_string(),
                    format!("{} {}", payout.car.make, payout.car.model),
                    payout
                        .owner
                        .as_ref()
                        .map_or_else(|| "unknown".to_string(), |owner| owner.email.clone()),
                    money(payout.transaction.amount),
                    money(payout.split.payout),
                    money(payout.split.platform_fee),
                ]
            });

            println!(
                "{}",
                table(
                    ["Transaction", "Car", "Owner", "Amount", "Payout", "Fee"],
                    rows,
                    3..6,
                )
            );
        }
        PayoutsSubcommand::Release(args) => {
            let release = payouts
                .release_payout(actor, args.transaction)
                .await
                .map_err(failed("release payout"))?;

            let transaction = release.transaction();
            let split = Split::of(transaction.amount)
                .map_err(failed("split transaction"))?;

            match release {
                PayoutRelease::Released(_) => println!("payout released"),
                PayoutRelease::AlreadyPaid(_) => println!("payout was already released"),
            }

            fields([
                ("transaction_uuid", transaction.uuid.to_string()),
                ("payout", money(split.payout)),
                ("platform_fee", money(split.platform_fee)),
            ]);
        }
        PayoutsSubcommand::Transactions(args) => {
            let transactions = payouts
                .list_transactions(
                    actor,
                    TransactionQuery {
                        booking: args.booking,
                        payout_status: args.payout_status,
                    },
                )
                .await
                .map_err(failed("list transactions"))?;

            if transactions.is_empty() {
                println!("no transactions found");
                return Ok(());
            }

            let rows = transactions.iter().map(|transaction| {
                [
                    transaction.uuid.to_string(),
                    transaction.booking_uuid.to_string(),
                    transaction.payment_status.to_string(),
                    transaction.payout_status.to_string(),
                    money(transaction.amount),
                ]
            });

            println!(
                "{}",
                table(
                    ["Transaction", "Booking", "Payment", "Payout", "Amount"],
                    rows,
                    4..5,
                )
            );
        }
        PayoutsSubcommand::Earnings => {
            let earnings = session
                .app
                .reports
                .owner_earnings(actor)
                .await
                .map_err(failed("compute earnings"))?;

            fields([
                ("bookings", earnings.bookings.to_string()),
                ("released", money(earnings.released)),
                ("pending", money(earnings.pending)),
                ("total", money(earnings.total())),
            ]);
        }
    }

    Ok(())
}
