use clap::{Args, Subcommand};
use driveshare::rules::PriceRules;
use driveshare_app::domain::rules::RulesService;
use rust_decimal::Decimal;

use crate::cli::{
    Session, failed,
    output::{fields, money},
};

#[derive(Debug, Args)]
pub(crate) struct RulesCommand {
    #[command(subcommand)]
    command: RulesSubcommand,
}

#[derive(Debug, Subcommand)]
enum RulesSubcommand {
    /// Show the current pricing rules
    Show,
    /// Replace the pricing rules (admin only); omitted values are kept
    Set(SetArgs),
}

#[derive(Debug, Args)]
struct SetArgs {
    #[arg(long)]
    weekend_multiplier: Option<Decimal>,

    #[arg(long)]
    seasonal_multiplier: Option<Decimal>,

    /// Deposit added to every booking, in cents
    #[arg(long)]
    deposit_fee: Option<u64>,
}

pub(crate) async fn run(command: RulesCommand, session: &Session) -> Result<(), String> {
    let rules = &session.app.rules;

    let current = rules
        .get_rules()
        .await
        .map_err(failed("load pricing rules"))?;

    let shown = match command.command {
        RulesSubcommand::Show => current,
        RulesSubcommand::Set(args) => rules
            .update_rules(
                session.actor,
                PriceRules {
                    weekend_multiplier: args
                        .weekend_multiplier
                        .unwrap_or(current.weekend_multiplier),
                    seasonal_multiplier: args
                        .seasonal_multiplier
                        .unwrap_or(current.seasonal_multiplier),
                    deposit_fee: args.deposit_fee.unwrap_or(current.deposit_fee),
                },
            )
            .await
            .map_err(failed("update pricing rules"))?,
    };

    print_rules(&shown);

    Ok(())
}

fn print_rules(rules: &PriceRules) {
    fields([
        ("weekend_multiplier", rules.weekend_multiplier.to_string()),
        ("seasonal_multiplier", rules.seasonal_multiplier.to_string()),
        ("deposit_fee", money(rules.deposit_fee)),
    ]);
}
